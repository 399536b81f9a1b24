pub mod alignment;
pub mod bam;
pub mod depth;
