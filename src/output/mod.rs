mod progress;
mod styling;
mod tables;

pub use progress::Spinner;
pub use styling::{dim, magenta_bold};
pub use tables::print_command_table;

/// Prints the tool banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔎 yamato-log-parser"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI failure classifier")
    );
}
