pub mod merge;
pub mod post_process;
pub mod startup;
pub mod status;
pub mod volume;
pub mod worker;
