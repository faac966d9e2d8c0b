pub mod associations;
pub mod fasta;
pub mod features;
pub mod phages;
pub mod ranking;
pub mod spacers;
