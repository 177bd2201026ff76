use fhirshape::{MemoryLookup, StructureDefinition};
use serde_json::{Value, json};

fn element(id: &str, type_code: &str, max: &str) -> Value {
    json!({
        "id": id,
        "path": id,
        "min": 0,
        "max": max,
        "type": [{"code": type_code}]
    })
}

#[allow(dead_code)]
pub fn coding_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "Coding",
        "url": "http://hl7.org/fhir/StructureDefinition/Coding",
        "name": "Coding",
        "status": "active",
        "kind": "complex-type",
        "type": "Coding",
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": "Coding", "path": "Coding", "min": 0, "max": "*"},
            element("Coding.system", "uri", "1"),
            element("Coding.version", "string", "1"),
            element("Coding.code", "code", "1"),
            element("Coding.display", "string", "1")
        ]}
    })
}

#[allow(dead_code)]
pub fn codeable_concept_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "CodeableConcept",
        "url": "http://hl7.org/fhir/StructureDefinition/CodeableConcept",
        "name": "CodeableConcept",
        "status": "active",
        "kind": "complex-type",
        "type": "CodeableConcept",
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": "CodeableConcept", "path": "CodeableConcept", "min": 0, "max": "*"},
            element("CodeableConcept.coding", "Coding", "*"),
            element("CodeableConcept.text", "string", "1")
        ]}
    })
}

#[allow(dead_code)]
pub fn quantity_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "Quantity",
        "url": "http://hl7.org/fhir/StructureDefinition/Quantity",
        "name": "Quantity",
        "status": "active",
        "kind": "complex-type",
        "type": "Quantity",
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": "Quantity", "path": "Quantity", "min": 0, "max": "*"},
            element("Quantity.value", "decimal", "1"),
            element("Quantity.unit", "string", "1"),
            element("Quantity.system", "uri", "1"),
            element("Quantity.code", "code", "1")
        ]}
    })
}

#[allow(dead_code)]
pub fn resource_doc(name: &str, base: Option<&str>, is_abstract: bool) -> Value {
    let mut doc = json!({
        "resourceType": "StructureDefinition",
        "id": name,
        "url": format!("http://hl7.org/fhir/StructureDefinition/{name}"),
        "name": name,
        "status": "active",
        "kind": "resource",
        "abstract": is_abstract,
        "type": name,
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": name, "path": name, "min": 0, "max": "*"}
        ]}
    });
    if let Some(base) = base {
        doc["baseDefinition"] = json!(format!("http://hl7.org/fhir/StructureDefinition/{base}"));
    }
    doc
}

#[allow(dead_code)]
pub fn observation_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "Observation",
        "url": "http://hl7.org/fhir/StructureDefinition/Observation",
        "name": "Observation",
        "status": "active",
        "kind": "resource",
        "type": "Observation",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/DomainResource",
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": "Observation", "path": "Observation", "min": 0, "max": "*"},
            {"id": "Observation.status", "path": "Observation.status", "min": 1, "max": "1",
             "type": [{"code": "code"}]},
            {"id": "Observation.code", "path": "Observation.code", "min": 1, "max": "1",
             "type": [{"code": "CodeableConcept"}]},
            {"id": "Observation.subject", "path": "Observation.subject", "min": 0, "max": "1",
             "type": [{"code": "Reference", "targetProfile": [
                 "http://hl7.org/fhir/StructureDefinition/Patient",
                 "http://hl7.org/fhir/StructureDefinition/Group"
             ]}]},
            {"id": "Observation.value[x]", "path": "Observation.value[x]", "min": 0, "max": "1",
             "type": [{"code": "Quantity"}, {"code": "CodeableConcept"}, {"code": "string"}]},
            {"id": "Observation.referenceRange", "path": "Observation.referenceRange",
             "min": 0, "max": "*", "type": [{"code": "BackboneElement"}]},
            {"id": "Observation.referenceRange.low", "path": "Observation.referenceRange.low",
             "min": 0, "max": "1", "type": [{"code": "Quantity"}]},
            {"id": "Observation.referenceRange.high", "path": "Observation.referenceRange.high",
             "min": 0, "max": "1", "type": [{"code": "Quantity"}]},
            {"id": "Observation.component", "path": "Observation.component", "min": 0, "max": "*",
             "type": [{"code": "BackboneElement"}]},
            {"id": "Observation.component.code", "path": "Observation.component.code",
             "min": 1, "max": "1", "type": [{"code": "CodeableConcept"}]},
            {"id": "Observation.component.value[x]", "path": "Observation.component.value[x]",
             "min": 0, "max": "1", "type": [{"code": "Quantity"}, {"code": "string"}]},
            {"id": "Observation.component.referenceRange",
             "path": "Observation.component.referenceRange", "min": 0, "max": "*",
             "contentReference": "#Observation.referenceRange"}
        ]}
    })
}

#[allow(dead_code)]
pub fn heart_rate_profile_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "heart-rate",
        "url": "http://example.org/StructureDefinition/heart-rate",
        "name": "HeartRateProfile",
        "status": "active",
        "kind": "resource",
        "type": "Observation",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Observation",
        "derivation": "constraint",
        "snapshot": {"element": [
            {"id": "Observation", "path": "Observation", "min": 0, "max": "*"}
        ]}
    })
}

#[allow(dead_code)]
pub fn primitive_doc(name: &str) -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": name,
        "url": format!("http://hl7.org/fhir/StructureDefinition/{name}"),
        "name": name,
        "status": "active",
        "kind": "primitive-type",
        "type": name,
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": name, "path": name, "min": 0, "max": "*"}
        ]}
    })
}

#[allow(dead_code)]
pub fn quantity_profile_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "simple-quantity",
        "url": "http://example.org/StructureDefinition/simple-quantity",
        "name": "SimpleQuantityProfile",
        "status": "active",
        "kind": "complex-type",
        "type": "Quantity",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Quantity",
        "derivation": "constraint",
        "snapshot": {"element": [
            {"id": "Quantity", "path": "Quantity", "min": 0, "max": "*"}
        ]}
    })
}

#[allow(dead_code)]
pub fn patient_specialization_doc() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "PatientSub",
        "url": "http://example.org/StructureDefinition/PatientSub",
        "name": "PatientSub",
        "status": "active",
        "kind": "resource",
        "type": "PatientSub",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Patient",
        "derivation": "specialization",
        "snapshot": {"element": [
            {"id": "PatientSub", "path": "PatientSub", "min": 0, "max": "*"}
        ]}
    })
}

#[allow(dead_code)]
pub fn value_set_doc(url: &str) -> Value {
    json!({
        "resourceType": "ValueSet",
        "id": "example-codes",
        "url": url,
        "name": "ExampleCodes",
        "status": "active"
    })
}

#[allow(dead_code)]
pub fn code_system_doc(url: &str) -> Value {
    json!({
        "resourceType": "CodeSystem",
        "id": "example-system",
        "url": url,
        "name": "ExampleSystem",
        "status": "active"
    })
}

#[allow(dead_code)]
pub fn standard_lookup() -> MemoryLookup {
    MemoryLookup::new()
        .with(observation_doc())
        .with(codeable_concept_doc())
        .with(coding_doc())
        .with(quantity_doc())
        .with(resource_doc("DomainResource", Some("Resource"), true))
        .with(resource_doc("Resource", None, true))
        .with(resource_doc("Patient", Some("DomainResource"), false))
        .with(resource_doc("Group", Some("DomainResource"), false))
        .with(resource_doc("Practitioner", Some("DomainResource"), false))
        .with(heart_rate_profile_doc())
        .with(primitive_doc("integer"))
        .with(quantity_profile_doc())
        .with(patient_specialization_doc())
}

#[allow(dead_code)]
pub fn observation_profile() -> StructureDefinition {
    let mut sd = StructureDefinition::from_json(&observation_doc(), true).unwrap();
    sd.url = "http://example.org/StructureDefinition/my-observation".to_string();
    sd.name = "MyObservation".to_string();
    sd.base_definition = Some("http://hl7.org/fhir/StructureDefinition/Observation".to_string());
    sd.derivation = Some("constraint".to_string());
    sd
}
