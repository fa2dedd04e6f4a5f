use std::process::ExitCode;

use json_conform::cli;

fn main() -> anyhow::Result<ExitCode> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.init_tracing();
    command_line_interface.run()
}
