//! Control and info parameter arrays.
//!
//! Both are fixed length `f64` arrays addressed by an enum, so a caller can
//! write `ctx.control[ControlParam::Prl] = 3.0` before a phase and read
//! `ctx.info[InfoParam::RCond]` after it. Unset info entries hold `-1`.

use std::fmt;
use std::ops::{Index,IndexMut};

pub const CONTROL_LEN : usize = 8;
pub const INFO_LEN : usize = 14;
pub const EMPTY : f64 = -1.0;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ControlParam{
    ///Print level: 0 or 1 prints nothing, 2 summaries, 3 and up more detail
    Prl,
    Strategy,
    PivotTolerance,
    SymPivotTolerance,
    Scale,
    IrStep,
    ///Trailing block density at which factorization goes dense
    DenseSwitch,
    ///Smallest trailing block factored dense
    DenseMin
}

impl ControlParam{
    pub const ALL : [ControlParam;CONTROL_LEN] = [ControlParam::Prl,ControlParam::Strategy,ControlParam::PivotTolerance,
        ControlParam::SymPivotTolerance,ControlParam::Scale,ControlParam::IrStep,ControlParam::DenseSwitch,ControlParam::DenseMin];
    fn slot(self) -> usize{ self as usize }
    fn describe(self) -> &'static str{
        match self{
            ControlParam::Prl => "print level",
            ControlParam::Strategy => "ordering strategy (0 auto, 1 unsymmetric, 3 symmetric)",
            ControlParam::PivotTolerance => "pivot tolerance",
            ControlParam::SymPivotTolerance => "symmetric pivot tolerance",
            ControlParam::Scale => "row scaling (0 none, 1 sum, 2 max)",
            ControlParam::IrStep => "max iterative refinement steps",
            ControlParam::DenseSwitch => "dense switch density",
            ControlParam::DenseMin => "dense switch minimum size"
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Strategy{
    Auto,
    Unsymmetric,
    Symmetric
}

impl Strategy{
    pub fn code(self) -> f64{
        match self{
            Strategy::Auto => 0.0,
            Strategy::Unsymmetric => 1.0,
            Strategy::Symmetric => 3.0
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ScaleMode{
    None,
    Sum,
    Max
}

#[derive(Debug,Clone,PartialEq)]
pub struct Control{
    values : [f64;CONTROL_LEN]
}

impl Default for Control{
    fn default() -> Self{
        let mut c = Control { values : [0.0;CONTROL_LEN] };
        c[ControlParam::Prl]=1.0;
        c[ControlParam::Strategy]=Strategy::Auto.code();
        c[ControlParam::PivotTolerance]=0.1;
        c[ControlParam::SymPivotTolerance]=0.001;
        c[ControlParam::Scale]=1.0;
        c[ControlParam::IrStep]=2.0;
        c[ControlParam::DenseSwitch]=0.4;
        c[ControlParam::DenseMin]=16.0;
        c
    }
}

impl Index<ControlParam> for Control{
    type Output=f64;
    fn index(&self,p : ControlParam) -> &f64{ &self.values[p.slot()] }
}

impl IndexMut<ControlParam> for Control{
    fn index_mut(&mut self,p : ControlParam) -> &mut f64{ &mut self.values[p.slot()] }
}

impl Control{
    pub fn print_level(&self) -> i64{
        self[ControlParam::Prl] as i64
    }

    pub fn strategy(&self) -> Strategy{
        match self[ControlParam::Strategy] as i64{
            1 => Strategy::Unsymmetric,
            3 => Strategy::Symmetric,
            _ => Strategy::Auto
        }
    }

    pub fn scale(&self) -> ScaleMode{
        match self[ControlParam::Scale] as i64{
            0 => ScaleMode::None,
            2 => ScaleMode::Max,
            _ => ScaleMode::Sum
        }
    }

    ///Pivot tolerance clamped to (0,1]. Out of range values mean the default.
    pub fn pivot_tolerance(&self,symmetric : bool) -> f64{
        let (v,default) = if symmetric {
            (self[ControlParam::SymPivotTolerance],0.001)
        } else {
            (self[ControlParam::PivotTolerance],0.1)
        };
        if v>0.0 && v<=1.0 { v } else { default }
    }

    pub fn irstep(&self) -> usize{
        let v = self[ControlParam::IrStep];
        if v>0.0 { v as usize } else { 0 }
    }

    pub fn dense_switch(&self) -> f64{
        self[ControlParam::DenseSwitch]
    }

    pub fn dense_min(&self) -> usize{
        let v = self[ControlParam::DenseMin];
        if v>1.0 { v as usize } else { 1 }
    }

    pub fn report(&self){
        if self.print_level()>=2{
            print!("{}",self);
        }
    }
}

impl fmt::Display for Control{
    fn fmt(&self,f : &mut fmt::Formatter<'_>) -> fmt::Result{
        writeln!(f,"Control:")?;
        for p in ControlParam::ALL.iter(){
            writeln!(f,"    {:?}: {} ({})",p,self[*p],p.describe())?;
        }
        Ok(())
    }
}


#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum InfoParam{
    Status,
    NRow,
    NCol,
    Nz,
    ///Nonzeros in L, unit diagonal included
    LNz,
    ///Nonzeros in U, diagonal included
    UNz,
    RCond,
    ///Number of trailing columns factored dense
    DenseColumns,
    StrategyUsed,
    SymbolicTime,
    NumericTime,
    SolveTime,
    IrTaken,
    ///Componentwise backward error of the last solve
    Omega
}

impl InfoParam{
    pub const ALL : [InfoParam;INFO_LEN] = [InfoParam::Status,InfoParam::NRow,InfoParam::NCol,InfoParam::Nz,InfoParam::LNz,
        InfoParam::UNz,InfoParam::RCond,InfoParam::DenseColumns,InfoParam::StrategyUsed,InfoParam::SymbolicTime,
        InfoParam::NumericTime,InfoParam::SolveTime,InfoParam::IrTaken,InfoParam::Omega];
    fn slot(self) -> usize{ self as usize }
}

#[derive(Debug,Clone,PartialEq)]
pub struct Info{
    values : [f64;INFO_LEN]
}

impl Default for Info{
    fn default() -> Self{
        Info { values : [EMPTY;INFO_LEN] }
    }
}

impl Index<InfoParam> for Info{
    type Output=f64;
    fn index(&self,p : InfoParam) -> &f64{ &self.values[p.slot()] }
}

impl IndexMut<InfoParam> for Info{
    fn index_mut(&mut self,p : InfoParam) -> &mut f64{ &mut self.values[p.slot()] }
}

impl Info{
    pub fn report(&self,print_level : i64){
        if print_level>=2{
            print!("{}",self);
        }
    }
}

impl fmt::Display for Info{
    fn fmt(&self,f : &mut fmt::Formatter<'_>) -> fmt::Result{
        writeln!(f,"Info:")?;
        for p in InfoParam::ALL.iter(){
            if self[*p] != EMPTY{
                writeln!(f,"    {:?}: {}",p,self[*p])?;
            }
        }
        Ok(())
    }
}
