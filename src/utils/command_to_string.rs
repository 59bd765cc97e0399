/// Render a command line for logging.
pub fn command_to_string(cmd: &std::process::Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    if args.is_empty() {
        program.into_owned()
    } else {
        format!("{} {}", program, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_renders_program_and_args() {
        let mut cmd = Command::new("trust4");
        cmd.arg("-t").arg("4").arg("-o").arg("temp_1");
        assert_eq!(command_to_string(&cmd), "trust4 -t 4 -o temp_1");
    }

    #[test]
    fn test_renders_bare_program() {
        let cmd = Command::new("samtools");
        assert_eq!(command_to_string(&cmd), "samtools");
    }
}
