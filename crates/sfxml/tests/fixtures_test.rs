use std::fs;

use sfxml::{as_array, parse, parse_observed, RoundTrip, Value};

fn fixture(name: &str) -> Result<String, std::io::Error> {
    fs::read_to_string(format!(
        "{}/tests/fixtures/valid/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
}

#[test]
fn test_valid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let valid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/valid");
    for entry in fs::read_dir(valid_dir)? {
        let entry = entry?;
        let path = entry.path();
        let content = fs::read_to_string(&path)?;
        if let Err(err) = parse_observed(&content, &mut RoundTrip) {
            return Err(std::io::Error::other(format!(
                "Failed to round trip valid file {path:?}: {err}"
            ))
            .into());
        }
    }
    Ok(())
}

#[test]
fn test_invalid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let invalid_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid");
    for entry in fs::read_dir(invalid_dir)? {
        let entry = entry?;
        let path = entry.path();
        let content = fs::read_to_string(&path)?;
        if parse(&content).is_ok() {
            return Err(std::io::Error::other(format!(
                "Should fail to parse invalid file: {path:?}"
            ))
            .into());
        }
    }
    Ok(())
}

#[test]
fn test_package_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let package = parse(&fixture("package.xml")?)?;
    assert_eq!(package.name, "Package");
    assert_eq!(
        package.attributes,
        " xmlns=\"http://soap.sforce.com/2006/04/metadata\""
    );

    let types = as_array(package.value.get("types"));
    assert_eq!(types.len(), 2);
    let names: Vec<_> = types.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, ["ApexClass", "CustomObject"]);

    let wildcard = types.first().map(|t| as_array(t.get("members")).len());
    assert_eq!(wildcard, Some(1));
    let objects = types.get(1).map(|t| as_array(t.get("members")).len());
    assert_eq!(objects, Some(2));

    assert_eq!(package.value["version"], Value::from("59.0"));
    Ok(())
}

#[test]
fn test_custom_object() -> Result<(), Box<dyn std::error::Error>> {
    let object = parse(&fixture("Account.object")?)?;
    let value = &object.value;

    assert_eq!(as_array(value.get("actionOverrides")).len(), 2);
    assert_eq!(value["description"], Value::from(""));
    assert_eq!(value["searchLayouts"], Value::from(""));
    assert_eq!(
        value["validationRules"]["errorConditionFormula"].as_str(),
        Some("ISBLANK(TEXT(Region__c)) && AnnualRevenue < 0")
    );
    assert_eq!(
        value["validationRules"]["errorMessage"].as_str(),
        Some("Region 'is' required")
    );
    assert_eq!(
        value["fields"]["picklist"]["picklistValues"]["fullName"].as_str(),
        Some("EMEA")
    );
    Ok(())
}

#[test]
fn test_query_response() -> Result<(), Box<dyn std::error::Error>> {
    let envelope = parse(&fixture("query_response.xml")?)?;
    let result = &envelope.value["soapenv:Body"]["queryResponse"]["result"];

    let complex = result.as_complex().ok_or("result is not complex")?;
    assert_eq!(complex.type_name.as_deref(), Some("QueryResult"));
    assert!(result["queryLocator"].is_nil());

    let records = as_array(result.get("records"));
    assert_eq!(records.len(), 2);
    let revenue = records
        .first()
        .and_then(|r| r["sf:AnnualRevenue"].as_complex())
        .ok_or("revenue is not typed")?;
    assert_eq!(revenue.type_name.as_deref(), Some("xsd:double"));
    assert_eq!(revenue.text.as_deref(), Some("1000000.0"));
    assert!(revenue.is_empty());
    assert_eq!(records.get(1).map(|r| r["sf:AnnualRevenue"].is_nil()), Some(true));
    Ok(())
}
