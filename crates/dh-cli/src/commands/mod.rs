pub mod launch_args;
pub mod run;
