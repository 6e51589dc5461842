pub mod history;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
 _ _       _             _
| (_)_ __ | | ____   ____| |_
| | | '_ \| |/ /\ \ / / _ \ __|
| | | | | |   <  \ V /  __/ |_
|_|_|_| |_|_|\_\  \_/ \___|\__|
"#;
    println!("{}", banner.cyan());
    println!(
        "  {} v{} - parallel link verifier\n",
        "linkvet".bright_white().bold(),
        env!("CARGO_PKG_VERSION")
    );
}
