//! Operator actions for a call-level route

use jobtriage_core::RecommendedRoute;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Next action offered to the call handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallAction {
    #[serde(rename = "Book Job")]
    BookJob,
    #[serde(rename = "Send Video Request")]
    SendVideoRequest,
    #[serde(rename = "Schedule Visit")]
    ScheduleVisit,
    #[serde(rename = "Refer to Specialist")]
    ReferToSpecialist,
}

impl CallAction {
    /// Button label shown to the operator
    pub fn label(&self) -> &'static str {
        match self {
            Self::BookJob => "Book Job",
            Self::SendVideoRequest => "Send Video Request",
            Self::ScheduleVisit => "Schedule Visit",
            Self::ReferToSpecialist => "Refer to Specialist",
        }
    }
}

impl From<RecommendedRoute> for CallAction {
    fn from(route: RecommendedRoute) -> Self {
        match route {
            RecommendedRoute::Instant => Self::BookJob,
            RecommendedRoute::Video => Self::SendVideoRequest,
            RecommendedRoute::Visit => Self::ScheduleVisit,
            RecommendedRoute::Refer => Self::ReferToSpecialist,
        }
    }
}

impl fmt::Display for CallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_to_action() {
        assert_eq!(CallAction::from(RecommendedRoute::Instant), CallAction::BookJob);
        assert_eq!(CallAction::from(RecommendedRoute::Refer).label(), "Refer to Specialist");
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&CallAction::SendVideoRequest).unwrap();
        assert_eq!(json, "\"Send Video Request\"");
    }
}
