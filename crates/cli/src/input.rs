//! Where the URLs of a run come from

use std::io::{self, BufRead, IsTerminal};

/// URLs from the command line followed by those piped on stdin
pub fn collect_urls(args: Vec<String>) -> io::Result<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(clean(args));
    }
    read_urls(args, stdin.lock())
}

/// Append one URL per non-blank line of `reader` to `args`
pub fn read_urls(args: Vec<String>, reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut urls = clean(args);
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            urls.push(line.to_string());
        }
    }
    Ok(urls)
}

fn clean(args: Vec<String>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_args_then_stdin_lines() {
        let stdin = Cursor::new("https://b.test\n\n  https://c.test  \n");
        let urls = read_urls(vec!["https://a.test".to_string()], stdin).unwrap();

        assert_eq!(urls, vec!["https://a.test", "https://b.test", "https://c.test"]);
    }

    #[test]
    fn test_empty_input_is_empty() {
        let urls = read_urls(Vec::new(), Cursor::new("")).unwrap();
        assert!(urls.is_empty());
    }
}
