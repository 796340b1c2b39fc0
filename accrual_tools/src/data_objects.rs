use std::{fmt::Display, str::FromStr, time::Duration};

use gm_common::Points;
use serde::{Deserialize, Serialize};

use crate::AccrualApiError;

/// The JSON body of a `200 OK` reply from the accrual service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccrualResponse {
    /// The order number, as a string of digits.
    #[serde(default)]
    pub order: String,
    pub status: String,
    /// Present only once the order has been processed and earned points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
}

/// Order states reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualStatus {
    /// The order is known to the service but scoring has not started.
    Registered,
    /// Scoring is under way.
    Processing,
    /// The order will never earn points.
    Invalid,
    /// Scoring is complete; the accompanying amount (possibly zero) is final.
    Processed,
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccrualStatus::Registered => write!(f, "REGISTERED"),
            AccrualStatus::Processing => write!(f, "PROCESSING"),
            AccrualStatus::Invalid => write!(f, "INVALID"),
            AccrualStatus::Processed => write!(f, "PROCESSED"),
        }
    }
}

impl FromStr for AccrualStatus {
    type Err = AccrualApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            _ => Err(AccrualApiError::UnknownStatus(s.to_string())),
        }
    }
}

/// The classified result of asking the accrual service about one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// The service knows the order. `accrual` is zero unless points were awarded.
    Resolved { status: AccrualStatus, accrual: Points },
    /// The service has nothing to say about this order yet.
    Pending,
    /// The service is throttling us. No further requests should be made until the next polling cycle.
    RateLimited { retry_after: Option<Duration> },
}

impl TryFrom<AccrualResponse> for AccrualOutcome {
    type Error = AccrualApiError;

    fn try_from(response: AccrualResponse) -> Result<Self, Self::Error> {
        if response.order.trim().is_empty() {
            return Ok(Self::Pending);
        }
        let status = response.status.parse::<AccrualStatus>()?;
        let accrual = match response.accrual {
            Some(amount) => Points::try_from_f64(amount)
                .map_err(|e| AccrualApiError::InvalidAccrualAmount(e.to_string()))?,
            None => Points::default(),
        };
        if accrual.value() < 0 {
            return Err(AccrualApiError::InvalidAccrualAmount(format!(
                "Order {} reported a negative accrual of {accrual}",
                response.order
            )));
        }
        Ok(Self::Resolved { status, accrual })
    }
}

#[cfg(test)]
mod test {
    use gm_common::Points;

    use super::*;

    fn response(order: &str, status: &str, accrual: Option<f64>) -> AccrualResponse {
        AccrualResponse { order: order.to_string(), status: status.to_string(), accrual }
    }

    #[test]
    fn statuses_are_case_insensitive() {
        assert_eq!("processed".parse::<AccrualStatus>().unwrap(), AccrualStatus::Processed);
        assert_eq!(" Registered".parse::<AccrualStatus>().unwrap(), AccrualStatus::Registered);
        assert!(matches!("DONE".parse::<AccrualStatus>(), Err(AccrualApiError::UnknownStatus(_))));
    }

    #[test]
    fn processed_with_points() {
        let outcome = AccrualOutcome::try_from(response("12345678903", "PROCESSED", Some(500.5))).unwrap();
        assert_eq!(outcome, AccrualOutcome::Resolved { status: AccrualStatus::Processed, accrual: Points::from(50050) });
    }

    #[test]
    fn missing_accrual_is_zero() {
        let outcome = AccrualOutcome::try_from(response("12345678903", "processing", None)).unwrap();
        assert_eq!(outcome, AccrualOutcome::Resolved {
            status: AccrualStatus::Processing,
            accrual: Points::default()
        });
    }

    #[test]
    fn empty_order_means_pending() {
        let outcome = AccrualOutcome::try_from(response("", "", None)).unwrap();
        assert_eq!(outcome, AccrualOutcome::Pending);
    }

    #[test]
    fn negative_accruals_are_rejected() {
        let err = AccrualOutcome::try_from(response("1", "PROCESSED", Some(-3.0))).unwrap_err();
        assert!(matches!(err, AccrualApiError::InvalidAccrualAmount(_)));
    }

    #[test]
    fn deserialize_wire_format() {
        let json = r#"{"order":"12345678903","status":"PROCESSED","accrual":729.98}"#;
        let r: AccrualResponse = serde_json::from_str(json).unwrap();
        assert_eq!(r.order, "12345678903");
        assert_eq!(r.accrual, Some(729.98));
        let json = r#"{"order":"12345678903","status":"REGISTERED"}"#;
        let r: AccrualResponse = serde_json::from_str(json).unwrap();
        assert!(r.accrual.is_none());
    }
}
