//! Phonebook 服务入口

use clap::Parser;
use phonebook::cli::{Cli, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run(Cli::parse()).await
}
