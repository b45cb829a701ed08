//! Prompt texts and response schemas for the two hosted-model calls.

use serde_json::{json, Value};

use crate::models::Confidence;

pub const DESCRIBE_DEFECT_PROMPT: &str = "generateAnomaliesDescription";
pub const INSPECT_BEARING_PROMPT: &str = "inspectBearing";

/// Asks the model to explain a defect that has already been decided.
pub fn describe_defect_instruction(defect_type: &str, confidence: Confidence) -> String {
    format!(
        "You are an expert in spotting defects in packaged products on a production line.\n\
         \n\
         The attached photo shows one product. A defect of the type below has been detected \
         with the given confidence score. Write a short but specific explanation of why the \
         defect was flagged, pointing at what in the image supports it.\n\
         \n\
         Defect Type: {defect_type}\n\
         Confidence Score: {:.4}\n",
        confidence.value()
    )
}

pub fn describe_defect_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": {
                "type": "STRING",
                "description": "Why the defect was detected."
            }
        },
        "required": ["description"]
    })
}

pub fn inspect_bearing_instruction() -> String {
    "You are an expert in recognising industrial bearings and finding defects in them.\n\
     \n\
     Analyse the attached photo:\n\
     1. Decide whether it shows an industrial bearing and set 'isBearing'.\n\
     2. If it does not, set 'result' to 'Not a bearing' and leave every other field out.\n\
     3. If it does, set 'result' to 'Normal' or 'Defective'.\n\
     4. For a defective bearing, name the 'defectType' (for example Corrosion, Spalling, \
        Crack, Discoloration), give a 'confidence' between 0 and 1, a 'boundingBox' around \
        the defect in percent of the image size (x, y from the top-left corner, width, \
        height), and a short 'description' of the problem.\n\
     5. For a normal bearing, set only 'result' and leave the defect fields out.\n"
        .to_string()
}

pub fn inspect_bearing_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isBearing": {
                "type": "BOOLEAN",
                "description": "Whether the image contains an industrial bearing."
            },
            "result": {
                "type": "STRING",
                "enum": ["Normal", "Defective", "Not a bearing"],
                "description": "Inspection result. Must be 'Not a bearing' when isBearing is false."
            },
            "defectType": {
                "type": "STRING",
                "description": "The type of defect detected, if any."
            },
            "confidence": {
                "type": "NUMBER",
                "description": "Confidence of the defect detection between 0 and 1."
            },
            "boundingBox": {
                "type": "OBJECT",
                "description": "Defect location in percent of the image extent.",
                "properties": {
                    "x": { "type": "NUMBER" },
                    "y": { "type": "NUMBER" },
                    "width": { "type": "NUMBER" },
                    "height": { "type": "NUMBER" }
                },
                "required": ["x", "y", "width", "height"]
            },
            "description": {
                "type": "STRING",
                "description": "Why the defect was detected."
            }
        },
        "required": ["isBearing", "result"]
    })
}
