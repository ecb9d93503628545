use memchr::memchr;

/// The input seam for the tokenizer: anything that can hand over the next
/// source line, or signal end-of-input with `None`. Lines are delivered
/// without their terminating newline.
pub trait SourceProvider {
    fn next_line(&mut self) -> Option<String>;
}

/// A provider over an in-memory string, splitting on `\n` and trimming a
/// trailing `\r` from each line so Windows line endings tokenize the same as
/// Unix ones.
pub struct InMemorySourceProvider {
    bytes: Vec<u8>,
    position: usize,
    exhausted: bool,
}

impl InMemorySourceProvider {
    pub fn new(source: &str) -> Self {
        Self {
            bytes: source.as_bytes().to_vec(),
            position: 0,
            exhausted: false,
        }
    }
}

impl SourceProvider for InMemorySourceProvider {
    fn next_line(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }

        let remaining = &self.bytes[self.position..];
        let line = match memchr(b'\n', remaining) {
            Some(index) => {
                self.position += index + 1;
                &remaining[..index]
            }
            None => {
                self.exhausted = true;
                remaining
            }
        };

        let line = match line.last() {
            Some(b'\r') => &line[..line.len() - 1],
            _ => line,
        };

        // The tokenizer only ever constructs this provider from &str input,
        // so the bytes between newlines are always valid UTF-8.
        Some(String::from_utf8_lossy(line).into_owned())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_lines_and_keeps_trailing_empty_line() {
        let mut provider = InMemorySourceProvider::new("one\ntwo\n");
        assert_eq!(provider.next_line().as_deref(), Some("one"));
        assert_eq!(provider.next_line().as_deref(), Some("two"));
        assert_eq!(provider.next_line().as_deref(), Some(""));
        assert_eq!(provider.next_line(), None);
    }

    #[test]
    fn trims_carriage_returns() {
        let mut provider = InMemorySourceProvider::new("one\r\ntwo");
        assert_eq!(provider.next_line().as_deref(), Some("one"));
        assert_eq!(provider.next_line().as_deref(), Some("two"));
        assert_eq!(provider.next_line(), None);
    }
}
