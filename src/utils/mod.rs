use std::path::Path;

pub mod strings;
#[cfg(test)]
pub mod testing;

/// Render a command line for error messages.
pub fn command_line(program: &Path, args: &[String]) -> Vec<String> {
    let mut line = vec![program.display().to_string()];
    line.extend(args.iter().cloned());
    line
}
