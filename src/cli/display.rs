use console::style;

pub fn print_banner() {
    println!(
        r#"
  {}
  {}
"#,
        style("deployhook").cyan().bold(),
        style("signed push -> deploy script").dim(),
    );
}

pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<16} {}", style(label).bold(), value);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", style("OK").green().bold(), msg);
}

pub fn print_error(msg: &str) {
    println!("  {} {}", style("ERROR").red().bold(), msg);
}
