//! Startup banner and exit summary.

/// What the banner reports about this run.
pub struct BannerInfo<'a> {
    /// `echo` or `process`.
    pub mode: &'a str,
    pub command_line: &'a str,
    pub db: &'a str,
}

/// Print the startup banner.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║          R E P L H O S T              ║
   ║    many interpreters, one terminal    ║
   ╚═══════════════════════════════════════╝

   version   {}
   mode      {}
   launches  {}
   db        {}

   type /help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        info.mode,
        info.command_line,
        info.db,
    );
}

/// Print how much was done and say goodbye.
pub fn print_session_summary(commands_sent: usize, sessions_opened: usize) {
    if commands_sent > 0 || sessions_opened > 0 {
        println!("sent {commands_sent} command(s) across {sessions_opened} session(s)");
    }
    println!("goodbye.");
}
