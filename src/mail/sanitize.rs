//! Header sanitation for documents that passed through mbox-style storage.

/// Drop mbox separator artifacts from the header block.
///
/// Within the header block (everything before the first empty line, or a
/// line holding only `\r`):
/// - lines starting with `>From` are dropped,
/// - lines starting with `From` but not `From:` are dropped.
///
/// Body lines are never touched. Applying this twice equals applying it
/// once.
pub fn sanitize_headers(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut in_headers = true;
    let mut first = true;

    for line in raw.split(|b| *b == b'\n') {
        if in_headers && (line.is_empty() || line == b"\r") {
            in_headers = false;
        }
        if in_headers && is_mbox_artifact(line) {
            continue;
        }
        if !first {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
        first = false;
    }

    out
}

fn is_mbox_artifact(line: &[u8]) -> bool {
    line.starts_with(b">From") || (line.starts_with(b"From") && !line.starts_with(b"From:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(s: &str) -> String {
        String::from_utf8(sanitize_headers(s.as_bytes())).unwrap()
    }

    #[test]
    fn drops_artifacts_and_keeps_body() {
        let raw = ">From someone\nFrom bob did something\nFrom: legit@x\nSubject: 1\n\nFrom the editor:\n>From quoted body\n";
        assert_eq!(
            sanitize(raw),
            "From: legit@x\nSubject: 1\n\nFrom the editor:\n>From quoted body\n"
        );
    }

    #[test]
    fn header_block_retains_only_from_colon() {
        let raw = ">From someone\nFrom bob did something\nFrom: legit@x\n\nbody";
        let cleaned = sanitize(raw);
        let header_block = cleaned.split("\n\n").next().unwrap();
        assert_eq!(header_block, "From: legit@x");
    }

    #[test]
    fn crlf_blank_line_ends_headers() {
        let raw = "From MAILER-DAEMON Mon Jan 1\r\nFrom: a@x\r\n\r\nFrom here on\r\n";
        assert_eq!(sanitize(raw), "From: a@x\r\n\r\nFrom here on\r\n");
    }

    #[test]
    fn clean_document_unchanged() {
        let raw = "From: a@x\nTo: b@y\nSubject: hi\n\nhello";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            ">From a\nFrom b\nFrom: c@x\n\nFrom d\n",
            "From x\n>From y\n\n\nFrom: body@x\n",
            "no headers at all",
            "\nFrom body only",
            "From: a@x\r\nFromage: yes\r\n\r\n>From",
        ];
        for input in inputs {
            let once = sanitize_headers(input.as_bytes());
            let twice = sanitize_headers(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn lookalike_headers_are_dropped() {
        // Only the exact `From:` prefix survives in the header block.
        assert_eq!(sanitize("Fromage: yes\nFrom: a@x\n\n"), "From: a@x\n\n");
    }
}
