//! DSP helpers shared by track effects and level reporting.

pub mod gain;
