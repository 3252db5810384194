//! Path template matching for OpenAPI `paths` keys.

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateSegment {
    Literal(String),
    Param {
        name: String,
        prefix: String,
        suffix: String,
    },
}

/// A parsed path template such as `/orders/{shipmentNo}/label.{format}`.
#[derive(Debug, Clone)]
pub(crate) struct PathTemplate {
    raw: String,
    segments: Vec<TemplateSegment>,
}

impl PathTemplate {
    pub(crate) fn parse(raw: &str) -> Self {
        let segments = split_path(raw)
            .map(|segment| match (segment.find('{'), segment.rfind('}')) {
                (Some(open), Some(close)) if open < close => TemplateSegment::Param {
                    name: segment[open + 1..close].to_string(),
                    prefix: segment[..open].to_string(),
                    suffix: segment[close + 1..].to_string(),
                },
                _ => TemplateSegment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of literal segments; more literals means a more specific match.
    pub(crate) fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, TemplateSegment::Literal(_)))
            .count()
    }

    /// Match a concrete path, returning captured path parameters.
    pub(crate) fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                TemplateSegment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                TemplateSegment::Param {
                    name,
                    prefix,
                    suffix,
                } => {
                    let value = part.strip_prefix(prefix.as_str())?;
                    let value = value.strip_suffix(suffix.as_str())?;
                    if value.is_empty() {
                        return None;
                    }
                    let value = match urlencoding::decode(value) {
                        Ok(decoded) => decoded.into_owned(),
                        Err(_) => value.to_string(),
                    };
                    captured.push((name.clone(), value));
                }
            }
        }

        Some(captured)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Candidate request paths: the path itself, then the path with each
/// server base path removed.
pub(crate) fn candidate_paths<'a>(path: &'a str, base_paths: &'a [String]) -> Vec<&'a str> {
    let mut candidates = vec![path];
    for base in base_paths {
        if let Some(rest) = path.strip_prefix(base.as_str()) {
            if rest.is_empty() {
                candidates.push("/");
            } else if rest.starts_with('/') {
                candidates.push(rest);
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_template_matches_exactly() {
        let template = PathTemplate::parse("/orders");
        assert_eq!(template.captures("/orders"), Some(vec![]));
        assert_eq!(template.captures("/orders/"), Some(vec![]));
        assert_eq!(template.captures("/order"), None);
        assert_eq!(template.captures("/orders/1"), None);
    }

    #[test]
    fn captures_whole_and_partial_segments() {
        let template = PathTemplate::parse("/labels/{shipmentNo}/doc.{format}");
        assert_eq!(
            template.captures("/labels/0034/doc.pdf"),
            Some(vec![
                ("shipmentNo".to_string(), "0034".to_string()),
                ("format".to_string(), "pdf".to_string()),
            ])
        );
        assert_eq!(template.captures("/labels/0034/doc."), None);
        assert_eq!(template.specificity(), 1);
    }

    #[test]
    fn captures_are_percent_decoded() {
        let template = PathTemplate::parse("/customers/{name}");
        assert_eq!(
            template.captures("/customers/M%C3%BCller%20GmbH"),
            Some(vec![("name".to_string(), "Müller GmbH".to_string())])
        );
        // Invalid UTF-8 after decoding keeps the raw text.
        assert_eq!(
            template.captures("/customers/%FF"),
            Some(vec![("name".to_string(), "%FF".to_string())])
        );
    }

    #[test]
    fn base_paths_are_stripped() {
        let bases = vec!["/parcel/de/shipping/v2".to_string()];
        assert_eq!(
            candidate_paths("/parcel/de/shipping/v2/orders", &bases),
            vec!["/parcel/de/shipping/v2/orders", "/orders"]
        );
        assert_eq!(
            candidate_paths("/parcel/de/shipping/v2", &bases),
            vec!["/parcel/de/shipping/v2", "/"]
        );
        assert_eq!(
            candidate_paths("/parcel/de/shipping/v2x", &bases),
            vec!["/parcel/de/shipping/v2x"]
        );
    }
}
