use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service plan tiers recommended from questionnaire answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Startup,
    Essential,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Startup => "startup",
            Plan::Essential => "essential",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn parse(value: &str) -> Option<Plan> {
        match value {
            "startup" => Some(Plan::Startup),
            "essential" => Some(Plan::Essential),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn answer<'a>(answers: &'a Value, key: &str) -> Option<&'a str> {
    answers.get(key).and_then(Value::as_str)
}

/// Pure decision table over the questionnaire answers. Conditions are
/// evaluated in strict priority order: enterprise first, then essential,
/// default startup. First match wins; there is no scoring or summation.
pub fn recommend_plan(answers: &Value) -> Plan {
    let revenue = answer(answers, "q1Revenue");
    let support = answer(answers, "q2Support");
    let customization = answer(answers, "q3Customization");

    if revenue == Some("R3") || support == Some("S3") || customization == Some("C3") {
        return Plan::Enterprise;
    }
    if revenue == Some("R2") || support == Some("S2") || customization == Some("C2") {
        return Plan::Essential;
    }
    Plan::Startup
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enterprise_revenue_dominates_support() {
        let plan = recommend_plan(&json!({ "q1Revenue": "R3", "q2Support": "S1" }));
        assert_eq!(plan, Plan::Enterprise);
    }

    #[test]
    fn essential_from_support_tier() {
        let plan = recommend_plan(&json!({ "q1Revenue": "R1", "q2Support": "S2" }));
        assert_eq!(plan, Plan::Essential);
    }

    #[test]
    fn startup_is_the_default() {
        let plan = recommend_plan(&json!({
            "q1Revenue": "R1",
            "q2Support": "S1",
            "q3Customization": "C1"
        }));
        assert_eq!(plan, Plan::Startup);
    }

    #[test]
    fn enterprise_dominates_essential_conditions() {
        // Both tiers match; the enterprise condition wins because it is
        // checked first.
        let plan = recommend_plan(&json!({ "q1Revenue": "R2", "q3Customization": "C3" }));
        assert_eq!(plan, Plan::Enterprise);
    }

    #[test]
    fn empty_answers_fall_through_to_startup() {
        assert_eq!(recommend_plan(&json!({})), Plan::Startup);
        assert_eq!(recommend_plan(&json!(null)), Plan::Startup);
    }

    #[test]
    fn is_pure_over_repeated_calls() {
        let answers = json!({ "q1Revenue": "R3" });
        assert_eq!(recommend_plan(&answers), recommend_plan(&answers));
    }

    #[test]
    fn plan_strings_round_trip() {
        for plan in [Plan::Startup, Plan::Essential, Plan::Enterprise] {
            assert_eq!(Plan::parse(plan.as_str()), Some(plan));
        }
    }
}
