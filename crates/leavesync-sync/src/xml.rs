/// Narrow, permissive extraction of `<Field>value</Field>` and
/// `<Field><![CDATA[value]]></Field>` from a callback XML envelope. Full XML
/// correctness (namespaces, attributes, nesting) is unnecessary — the
/// upstream platform's callback bodies are a small flat set of known fields.
pub fn extract_field(xml: &str, field: &str) -> Option<String> {
    let open = format!("<{field}>");
    let close = format!("</{field}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    let inner = xml[start..end].trim();

    if let Some(cdata) = inner.strip_prefix("<![CDATA[") {
        cdata.strip_suffix("]]>").map(str::to_string)
    } else {
        Some(inner.to_string())
    }
}

/// Parsed fields of one `<ApprovalInfo>` event body, per §4.9 step 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalInfoEvent {
    pub sp_no: String,
    pub sp_status: Option<i64>,
    pub sp_name: Option<String>,
    pub status_change_event: Option<i64>,
}

pub fn parse_approval_info(xml: &str) -> Option<ApprovalInfoEvent> {
    let sp_no = extract_field(xml, "SpNo")?;
    Some(ApprovalInfoEvent {
        sp_no,
        sp_status: extract_field(xml, "SpStatus").and_then(|s| s.parse().ok()),
        sp_name: extract_field(xml, "SpName"),
        status_change_event: extract_field(xml, "StatuChangeEvent").and_then(|s| s.parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cdata_wrapped_field() {
        let xml = "<xml><Encrypt><![CDATA[abc123]]></Encrypt></xml>";
        assert_eq!(extract_field(xml, "Encrypt"), Some("abc123".to_string()));
    }

    #[test]
    fn extracts_plain_field() {
        let xml = "<xml><SpNo>202008026</SpNo></xml>";
        assert_eq!(extract_field(xml, "SpNo"), Some("202008026".to_string()));
    }

    #[test]
    fn parses_full_approval_info_event() {
        let xml = r#"<xml>
            <ApprovalInfo>
                <SpNo><![CDATA[202008026]]></SpNo>
                <SpStatus>2</SpStatus>
                <SpName><![CDATA[leave]]></SpName>
                <StatuChangeEvent>1</StatuChangeEvent>
            </ApprovalInfo>
        </xml>"#;
        let event = parse_approval_info(xml).unwrap();
        assert_eq!(event.sp_no, "202008026");
        assert_eq!(event.sp_status, Some(2));
        assert_eq!(event.sp_name.as_deref(), Some("leave"));
        assert_eq!(event.status_change_event, Some(1));
    }

    #[test]
    fn missing_sp_no_yields_none() {
        assert_eq!(parse_approval_info("<xml></xml>"), None);
    }
}
