use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use serde_json::{json, Value};

use crate::error::Result;
use crate::tool::Tool;

/// Reports the current date and time, optionally in a named timezone.
/// Invalid timezone identifiers fall back to UTC with a note rather than
/// failing, so the model always gets a usable answer.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Accepts an optional IANA timezone identifier; defaults to UTC."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone identifier, e.g. `Europe/Berlin`"
                }
            }
        })
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let requested = input
            .get("timezone")
            .and_then(Value::as_str)
            .unwrap_or("UTC");
        let now = Utc::now();

        match requested.parse::<Tz>() {
            Ok(tz) => {
                let local = now.with_timezone(&tz);
                Ok(json!({
                    "timezone": requested,
                    "datetime": local.to_rfc3339(),
                    "weekday": local.format("%A").to_string(),
                }))
            }
            Err(_) => Ok(json!({
                "timezone": "UTC",
                "datetime": now.to_rfc3339(),
                "weekday": now.format("%A").to_string(),
                "note": format!("unrecognized timezone `{requested}`, falling back to UTC"),
            })),
        }
    }
}
