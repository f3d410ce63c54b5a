//! JSON schema definitions for bundle validation.

/// JSON Schema for the bundle summary document.
pub const SUMMARY_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "https://ssrsmigrate.dev/schemas/export-summary.json",
  "title": "SSRSMigrate Export Summary",
  "type": "object",
  "required": ["SourceRootPath", "SourceVersion", "Entries"],
  "properties": {
    "SourceRootPath": { "type": "string" },
    "SourceVersion": {
      "type": "string",
      "enum": [
        "SqlServer2005",
        "SqlServer2008",
        "SqlServer2008R2",
        "SqlServer2012",
        "SqlServer2014",
        "SqlServer2016",
        "SqlServer2017",
        "SqlServer2019"
      ]
    },
    "Entries": {
      "type": "object",
      "required": ["DataSources", "Reports", "Folders"],
      "properties": {
        "DataSources": { "$ref": "#/definitions/entryList" },
        "Reports": { "$ref": "#/definitions/entryList" },
        "Folders": { "$ref": "#/definitions/entryList" }
      }
    }
  },
  "definitions": {
    "entryList": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["Path", "FileName", "CheckSum"],
        "properties": {
          "Path": { "type": "string", "minLength": 1 },
          "FileName": { "type": "string" },
          "CheckSum": { "type": "string", "pattern": "^[0-9a-f]*$" }
        }
      }
    }
  }
}"##;

/// Get the summary schema as a parsed JSON value.
pub fn summary_schema() -> serde_json::Value {
    serde_json::from_str(SUMMARY_SCHEMA).expect("Invalid summary schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonschema::JSONSchema;
    use serde_json::json;

    #[test]
    fn test_schema_compiles() {
        let schema = summary_schema();
        assert_eq!(
            schema["properties"]["Entries"]["properties"]["Reports"]["$ref"],
            "#/definitions/entryList"
        );
        assert!(JSONSchema::compile(&schema).is_ok());
    }

    #[test]
    fn test_entry_lists_resolve_definition() {
        let schema_value = summary_schema();
        let schema = JSONSchema::compile(&schema_value).unwrap();
        let valid = json!({
            "SourceRootPath": "/SSRSMigrate_AW_Tests",
            "SourceVersion": "SqlServer2008R2",
            "Entries": {
                "DataSources": [],
                "Reports": [{
                    "Path": "Export\\SSRSMigrate_AW_Tests\\Reports",
                    "FileName": "Company Sales.rdl",
                    "CheckSum": "1adde7720ca2f0af49550fc676f70804"
                }],
                "Folders": []
            }
        });
        assert!(schema.is_valid(&valid));

        let mut not_a_list = valid.clone();
        not_a_list["Entries"]["Reports"] = json!({});
        assert!(!schema.is_valid(&not_a_list));

        let mut missing_checksum = valid;
        missing_checksum["Entries"]["Reports"][0]
            .as_object_mut()
            .unwrap()
            .remove("CheckSum");
        assert!(!schema.is_valid(&missing_checksum));
    }
}
