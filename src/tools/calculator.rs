//! Basic arithmetic as a single dispatch-by-operation tool.
//!
//! Domain errors (division by zero, square root of a negative) are returned
//! as in-band `error` fields so the model can react to them.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{ColloquyError, Result};
use crate::tool::Tool;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform arithmetic. Expects {\"operation\": add|subtract|multiply|divide|power|sqrt, \"a\": number, \"b\": number (unused for sqrt)}."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide", "power", "sqrt"]
                },
                "a": {"type": "number"},
                "b": {"type": "number"}
            },
            "required": ["operation", "a"]
        })
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let operation = input
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| ColloquyError::Validation("missing `operation` for calculator".into()))?;
        let a = get_number(&input, "a")?;

        let result = match operation {
            "add" => a + get_number(&input, "b")?,
            "subtract" => a - get_number(&input, "b")?,
            "multiply" => a * get_number(&input, "b")?,
            "divide" => {
                let b = get_number(&input, "b")?;
                if b == 0.0 {
                    return Ok(json!({
                        "operation": operation,
                        "error": "division by zero is undefined"
                    }));
                }
                a / b
            }
            "power" => a.powf(get_number(&input, "b")?),
            "sqrt" => {
                if a < 0.0 {
                    return Ok(json!({
                        "operation": operation,
                        "error": "square root of a negative number is undefined"
                    }));
                }
                a.sqrt()
            }
            other => {
                return Ok(json!({
                    "operation": other,
                    "error": format!("unsupported operation `{other}`")
                }))
            }
        };

        Ok(json!({ "operation": operation, "result": result }))
    }
}

fn get_number(input: &Value, field: &str) -> Result<f64> {
    input
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| ColloquyError::Validation(format!("missing `{field}` for calculator")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn adds_numbers() {
        let result = CalculatorTool
            .call(json!({"operation": "add", "a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(result["result"], 5.0);
    }

    #[tokio::test]
    async fn division_by_zero_is_in_band_error() {
        let result = CalculatorTool
            .call(json!({"operation": "divide", "a": 1, "b": 0}))
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("zero"));
    }

    #[tokio::test]
    async fn sqrt_ignores_b() {
        let result = CalculatorTool
            .call(json!({"operation": "sqrt", "a": 9}))
            .await
            .unwrap();
        assert_eq!(result["result"], 3.0);
    }

    #[tokio::test]
    async fn unsupported_operation_is_in_band_error() {
        let result = CalculatorTool
            .call(json!({"operation": "modulo", "a": 5, "b": 2}))
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("modulo"));
    }

    #[tokio::test]
    async fn missing_operand_is_a_validation_error() {
        let err = CalculatorTool
            .call(json!({"operation": "add", "a": 1}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("`b`"));
    }
}
