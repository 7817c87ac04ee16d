// src/shell/placeholders.rs
use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"<([A-Za-z_][A-Za-z0-9_.\-]*)>").unwrap();
}

/// Placeholder names in order of first appearance, without duplicates.
pub fn find_placeholders(command: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in PLACEHOLDER_RE.captures_iter(command) {
        let name = captures[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Replace `<name>` placeholders with values obtained from `ask`.
///
/// Declared inputs are asked for first, in the order the model listed them,
/// then any placeholder the model forgot to declare. `sudo` is never asked
/// for; it only marks the command as needing admin rights.
pub fn fill_placeholders<F>(command: &str, user_inputs: &[String], mut ask: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    debug!("Replacing placeholders in command: {}", command);
    let mut final_command = command.to_string();

    let mut names: Vec<String> = user_inputs
        .iter()
        .filter(|name| !name.eq_ignore_ascii_case("sudo"))
        .filter(|name| command.contains(&format!("<{}>", name)))
        .cloned()
        .collect();
    for name in find_placeholders(command) {
        if !names.contains(&name) && !name.eq_ignore_ascii_case("sudo") {
            names.push(name);
        }
    }

    for name in names {
        let value = ask(&name)?;
        let placeholder = format!("<{}>", name);
        final_command = final_command.replace(&placeholder, &value);
        debug!("Replaced '{}' with '{}'", placeholder, value);
    }

    debug!("Final command after replacement: {}", final_command);
    Ok(final_command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_find_placeholders() {
        assert_eq!(
            find_placeholders("cp <source> <dest> && ls <dest>"),
            vec!["source", "dest"]
        );
        assert!(find_placeholders("sort < input.txt > output.txt").is_empty());
    }

    #[test]
    fn test_declared_inputs_are_substituted() {
        let values = answers(&[("folder_name", "projects")]);
        let mut asked = Vec::new();
        let result = fill_placeholders("mkdir <folder_name>", &["folder_name".to_string()], |name| {
            asked.push(name.to_string());
            Ok(values[name].clone())
        })
        .unwrap();

        assert_eq!(result, "mkdir projects");
        assert_eq!(asked, vec!["folder_name"]);
    }

    #[test]
    fn test_undeclared_placeholders_are_asked_for() {
        let values = answers(&[("src", "a.txt"), ("dst", "b.txt")]);
        let result = fill_placeholders("cp <src> <dst>", &["src".to_string()], |name| {
            Ok(values[name].clone())
        })
        .unwrap();

        assert_eq!(result, "cp a.txt b.txt");
    }

    #[test]
    fn test_sudo_is_never_asked_for() {
        let result = fill_placeholders(
            "apt install <package>",
            &["sudo".to_string(), "package".to_string()],
            |name| {
                assert_ne!(name, "sudo");
                Ok("htop".to_string())
            },
        )
        .unwrap();

        assert_eq!(result, "apt install htop");
    }

    #[test]
    fn test_repeated_placeholder_asked_once() {
        let mut count = 0;
        let result = fill_placeholders("touch <name> && cat <name>", &[], |_| {
            count += 1;
            Ok("notes.md".to_string())
        })
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(result, "touch notes.md && cat notes.md");
    }

    #[test]
    fn test_prompt_errors_propagate() {
        let result = fill_placeholders("mkdir <dir>", &[], |_| Err(anyhow::anyhow!("closed")));
        assert!(result.is_err());
    }
}
