/// CSV assembly for the report downloads. Every field is quoted; embedded
/// quotes are doubled per RFC 4180.
pub fn field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn line(values: &[&str]) -> String {
    values.iter().map(|v| field(v)).collect::<Vec<_>>().join(",")
}

/// Join a header and data lines into the final document body.
pub fn document(header: &str, lines: &[String]) -> String {
    let mut out = Vec::with_capacity(lines.len() + 1);
    out.push(header.to_string());
    out.extend(lines.iter().cloned());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_quoted() {
        assert_eq!(field("Asha"), "\"Asha\"");
        assert_eq!(field(""), "\"\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(field(r#"Asha "A" Rahman"#), r#""Asha ""A"" Rahman""#);
    }

    #[test]
    fn commas_survive_inside_quotes() {
        let l = line(&["Rahman, Asha", "S100"]);
        assert_eq!(l, r#""Rahman, Asha","S100""#);
    }

    #[test]
    fn document_counts_header_plus_rows() {
        let doc = document("A,B", &[line(&["1", "2"]), line(&["3", "4"])]);
        assert_eq!(doc.lines().count(), 3);
        assert!(doc.starts_with("A,B\n"));
    }
}
