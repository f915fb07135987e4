use clap::CommandFactory;
use clap_complete::{Generator, Shell};
use clap_mangen::Man;
use std::path::PathBuf;

// CLI definition shared with the binary
include!("src/cli/app.rs");

const BIN_NAME: &str = "sqlb";

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli/app.rs");

    let out_dir =
        PathBuf::from(std::env::var("OUT_DIR").unwrap_or_else(|_| "target/man".to_string()));
    let man_dir = out_dir.join("man");
    std::fs::create_dir_all(&man_dir)?;

    let cmd = Cli::command();

    let mut buf = Vec::new();
    Man::new(cmd.clone()).render(&mut buf)?;
    std::fs::write(man_dir.join(format!("{}.1", BIN_NAME)), buf)?;

    for sub in cmd.get_subcommands() {
        let mut buf = Vec::new();
        Man::new(sub.clone()).render(&mut buf)?;
        std::fs::write(man_dir.join(format!("{}-{}.1", BIN_NAME, sub.get_name())), buf)?;
    }

    let completions_dir = out_dir.join("completions");
    std::fs::create_dir_all(&completions_dir)?;

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut buf);
        std::fs::write(completions_dir.join(shell.file_name(BIN_NAME)), buf)?;
    }

    Ok(())
}
