use clap::Parser;

mod cmds;

fn main() {
    let mut cli = cmds::Cli::parse();
    if let Err(e) = cli.run_program() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
