use std::io;

use sjis_converter::action::cli::process_args;

fn main() -> io::Result<()> {
    process_args()
}
