fn main() {
    //Dense kernels of the trailing block and refinement come from the
    //system LAPACK and BLAS
    println!("cargo:rustc-link-lib=blas");
    println!("cargo:rustc-link-lib=lapack");
}
