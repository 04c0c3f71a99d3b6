pub mod cli;
pub mod error;
pub mod git;
pub mod github;
pub mod model;
pub mod report;
pub mod util;
pub mod window;
