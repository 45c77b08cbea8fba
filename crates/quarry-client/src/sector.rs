/// Map an ATS department or team name onto a sector label.
///
/// Returns `None` for departments that don't match a known sector, leaving
/// the default to normalization.
pub fn sector_for(department: &str) -> Option<&'static str> {
    let department = department.to_lowercase();
    let matches = |needles: &[&str]| needles.iter().any(|n| department.contains(n));

    if matches(&["engineer", "developer", "software", "data", "infrastructure", "platform", "security", "it "]) {
        Some("engineering")
    } else if matches(&["design", "ux", "ui ", "creative", "brand"]) {
        Some("design")
    } else if matches(&["marketing", "growth", "content", "communications", "pr "]) {
        Some("marketing")
    } else if matches(&["sales", "business development", "account", "revenue", "partnership"]) {
        Some("sales")
    } else if matches(&["operations", "ops", "finance", "people", "hr", "legal", "support", "customer success"]) {
        Some("operations")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_departments() {
        assert_eq!(sector_for("Engineering"), Some("engineering"));
        assert_eq!(sector_for("Software Development"), Some("engineering"));
        assert_eq!(sector_for("Product Design"), Some("design"));
        assert_eq!(sector_for("Growth Marketing"), Some("marketing"));
        assert_eq!(sector_for("Sales"), Some("sales"));
        assert_eq!(sector_for("Business Operations"), Some("operations"));
        assert_eq!(sector_for("People"), Some("operations"));
    }

    #[test]
    fn unknown_department() {
        assert_eq!(sector_for("Executive"), None);
        assert_eq!(sector_for(""), None);
    }
}
