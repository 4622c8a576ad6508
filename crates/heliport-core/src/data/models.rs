//! Rows exchanged with the hosted data service.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::DataError;
use crate::utils::{format_duration, format_price};

/// Most passengers a single booking can carry.
pub const MAX_PASSENGERS: u32 = 6;

// ============================================================================
// Fleet & Routes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Helicopter {
    pub id: String,
    pub name: String,
    pub model: String,
    pub capacity: u32,
    pub hourly_rate: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
    pub status: String,
}

impl Helicopter {
    /// "Bell 407 (Bell 407GXi) - 6 seats"
    pub fn label(&self) -> String {
        format!("{} ({}) - {} seats", self.name, self.model, self.capacity)
    }

    pub fn rate_display(&self) -> String {
        format!("{}/hour", format_price(self.hourly_rate))
    }

    /// Specification rows as ("Max speed", "155 mph"), in key order.
    pub fn specification_rows(&self) -> Vec<(String, String)> {
        let Some(ref specs) = self.specifications else {
            return Vec::new();
        };
        specs
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (spec_label(key), value)
            })
            .collect()
    }
}

/// "max_speed" -> "Max speed"
fn spec_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub from_location: String,
    pub to_location: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub distance_miles: Option<f64>,
    pub price_per_person: f64,
}

impl Route {
    pub fn label(&self) -> String {
        format!("{} → {}", self.from_location, self.to_location)
    }

    /// "Manhattan → JFK - 15 min - $195"
    pub fn summary(&self) -> String {
        format!(
            "{} - {} - {}",
            self.label(),
            format_duration(self.duration_minutes),
            format_price(self.price_per_person)
        )
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Other(String),
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "pending" => BookingStatus::Pending,
            "confirmed" => BookingStatus::Confirmed,
            "completed" => BookingStatus::Completed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(s),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => "pending".to_string(),
            BookingStatus::Confirmed => "confirmed".to_string(),
            BookingStatus::Completed => "completed".to_string(),
            BookingStatus::Cancelled => "cancelled".to_string(),
            BookingStatus::Other(s) => s,
        }
    }
}

impl BookingStatus {
    pub fn display_name(&self) -> &str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Other(s) => s,
        }
    }
}

/// A booking request as entered by the customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingRequest {
    pub helicopter_id: Option<String>,
    pub route_id: Option<String>,
    pub departure_point: String,
    pub destination: String,
    /// YYYY-MM-DD
    pub flight_date: String,
    /// HH:MM
    pub flight_time: String,
    pub passengers: u32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl BookingRequest {
    /// Check the request before it is sent. Reports the first problem found.
    pub fn validate(&self) -> Result<(), DataError> {
        let required = [
            (&self.customer_name, "Full name"),
            (&self.customer_email, "Email"),
            (&self.customer_phone, "Phone"),
            (&self.departure_point, "Departure point"),
            (&self.destination, "Destination"),
            (&self.flight_date, "Flight date"),
            (&self.flight_time, "Flight time"),
        ];
        for (value, field) in required {
            if value.trim().is_empty() {
                return Err(DataError::Validation(format!("{} is required", field)));
            }
        }

        let email = self.customer_email.trim();
        let valid_email = email
            .split_once('@')
            .map(|(user, domain)| !user.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(DataError::Validation("Email address is not valid".to_string()));
        }

        if NaiveDate::parse_from_str(self.flight_date.trim(), "%Y-%m-%d").is_err() {
            return Err(DataError::Validation(
                "Flight date must be YYYY-MM-DD".to_string(),
            ));
        }
        if NaiveTime::parse_from_str(self.flight_time.trim(), "%H:%M").is_err() {
            return Err(DataError::Validation("Flight time must be HH:MM".to_string()));
        }

        if !(1..=MAX_PASSENGERS).contains(&self.passengers) {
            return Err(DataError::Validation(format!(
                "Passengers must be between 1 and {}",
                MAX_PASSENGERS
            )));
        }

        Ok(())
    }

    /// Whether the party fits in `helicopter`
    pub fn fits_capacity(&self, helicopter: &Helicopter) -> bool {
        self.passengers <= helicopter.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub helicopter_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    pub departure_point: String,
    pub destination: String,
    pub flight_date: String,
    pub flight_time: String,
    pub passengers: u32,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Customer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub id: String,
    pub route_from: String,
    pub route_to: String,
    pub flight_date: String,
    pub flight_time: String,
    pub passengers: u32,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub helicopter_used: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Everything the customer dashboard shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub profile: Option<Profile>,
    pub order_history: Vec<OrderHistory>,
    pub recent_bookings: Vec<Booking>,
}

impl Dashboard {
    /// Greeting name: profile name, else the fallback (usually the email)
    pub fn greeting_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.profile
            .as_ref()
            .and_then(|p| p.full_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> BookingRequest {
        BookingRequest {
            helicopter_id: None,
            route_id: Some("route-1".to_string()),
            departure_point: "Manhattan Heliport".to_string(),
            destination: "JFK".to_string(),
            flight_date: "2025-06-01".to_string(),
            flight_time: "14:30".to_string(),
            passengers: 2,
            customer_name: "Amelia Earhart".to_string(),
            customer_email: "amelia@example.com".to_string(),
            customer_phone: "555-0100".to_string(),
            special_requests: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_reported_by_name() {
        let mut request = valid_request();
        request.destination = "  ".to_string();
        match request.validate() {
            Err(DataError::Validation(msg)) => assert_eq!(msg, "Destination is required"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bad_email_date_time_and_passengers() {
        let mut request = valid_request();
        request.customer_email = "amelia".to_string();
        assert!(request.validate().is_err());

        let mut request = valid_request();
        request.flight_date = "06/01/2025".to_string();
        assert!(request.validate().is_err());

        let mut request = valid_request();
        request.flight_time = "2:30pm".to_string();
        assert!(request.validate().is_err());

        let mut request = valid_request();
        request.passengers = 0;
        assert!(request.validate().is_err());
        request.passengers = MAX_PASSENGERS + 1;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_serializes_nulls_for_unchosen_ids() {
        let value = serde_json::to_value(valid_request()).expect("serialize");
        assert!(value["helicopter_id"].is_null());
        assert_eq!(value["route_id"], "route-1");
        assert!(value.get("special_requests").is_none());
    }

    #[test]
    fn test_booking_status_parsing() {
        let statuses: Vec<BookingStatus> =
            serde_json::from_str(r#"["pending","Confirmed","completed","canceled","delayed"]"#)
                .expect("parse");
        assert_eq!(
            statuses,
            vec![
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
                BookingStatus::Other("delayed".to_string()),
            ]
        );
        assert_eq!(serde_json::to_string(&BookingStatus::Pending).expect("ser"), "\"pending\"");
        assert_eq!(BookingStatus::Other("delayed".to_string()).display_name(), "delayed");
    }

    #[test]
    fn test_helicopter_parsing_and_specifications() {
        let json = r#"{
            "id": "h1", "name": "Sky One", "model": "Bell 407", "capacity": 6,
            "hourly_rate": 2500, "status": "available",
            "specifications": {"max_speed": "155 mph", "range": 370}
        }"#;
        let heli: Helicopter = serde_json::from_str(json).expect("parse");
        assert_eq!(heli.label(), "Sky One (Bell 407) - 6 seats");
        assert_eq!(heli.rate_display(), "$2500/hour");
        assert_eq!(
            heli.specification_rows(),
            vec![
                ("Max speed".to_string(), "155 mph".to_string()),
                ("Range".to_string(), "370".to_string()),
            ]
        );

        let mut request = valid_request();
        request.passengers = 6;
        assert!(request.fits_capacity(&heli));
        request.passengers = 7;
        assert!(!request.fits_capacity(&heli));
    }

    #[test]
    fn test_route_summary() {
        let route: Route = serde_json::from_str(
            r#"{"id":"r1","from_location":"Manhattan","to_location":"JFK","duration_minutes":15,"price_per_person":195}"#,
        )
        .expect("parse");
        assert_eq!(route.summary(), "Manhattan → JFK - 15 min - $195");
        assert!(route.distance_miles.is_none());
    }

    #[test]
    fn test_dashboard_greeting() {
        let mut dashboard = Dashboard::default();
        assert_eq!(dashboard.greeting_name("a@b.com"), "a@b.com");
        dashboard.profile = Some(Profile {
            id: "u".to_string(),
            email: None,
            full_name: Some("Amelia".to_string()),
            avatar_url: None,
            phone: None,
        });
        assert_eq!(dashboard.greeting_name("a@b.com"), "Amelia");
    }
}
