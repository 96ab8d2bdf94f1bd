//! Trial documents read from a plain-text file.

/// Split `text` into documents separated by blank lines, keeping at most `limit`.
pub fn split_documents(text: &str, limit: usize) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                documents.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        documents.push(current.join("\n"));
    }

    documents.truncate(limit);
    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_separate_documents() {
        let text = "Trial one.\nMore on one.\n\n\n  \nTrial two.\n";
        assert_eq!(
            split_documents(text, 50),
            vec!["Trial one.\nMore on one.", "Trial two."]
        );
    }

    #[test]
    fn test_limit_applies() {
        assert_eq!(split_documents("a\n\nb\n\nc", 2), vec!["a", "b"]);
        assert!(split_documents("", 10).is_empty());
    }
}
