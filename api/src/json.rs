use memchr::memmem;

use crate::domains::Dinosaur;

pub const NAME_KEY: &str = "Dinosaurio";

pub fn encode_dinosaur(dinosaur: &Dinosaur) -> String {
    format!(
        "{{ \"id\": {}, \"status\": {}, \"{NAME_KEY}\": {} }}",
        dinosaur.id,
        string_literal(&dinosaur.status),
        string_literal(&dinosaur.name),
    )
}

pub fn encode_list(dinosaurs: &[Dinosaur]) -> String {
    let items: Vec<String> = dinosaurs.iter().map(encode_dinosaur).collect();
    format!("[{}]", items.join(","))
}

pub fn encode_error(message: &str) -> String {
    format!("{{ \"error\": {} }}", string_literal(message))
}

// `None` is absence, never an empty value
pub fn extract_field<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{key}\":\"");
    let start = memmem::find(body.as_bytes(), needle.as_bytes())? + needle.len();
    let len = memchr::memchr(b'"', &body.as_bytes()[start..])?;

    Some(&body[start..start + len])
}

#[inline]
fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}
