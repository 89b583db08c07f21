//! Schema object statements: types and functions.

use crate::catalog::{
    BaseTypeDefinition, CatalogObjectRecord, CompositeTypeDefinition, DomainDefinition,
    FunctionDefinition,
};

fn qualified(record: &CatalogObjectRecord) -> String {
    if record.schema.is_empty() {
        record.name.clone()
    } else {
        format!("{}.{}", record.schema, record.name)
    }
}

pub(super) fn shell_type(record: &CatalogObjectRecord) -> String {
    format!("\n\nCREATE TYPE {};", qualified(record))
}

fn alignment_name(code: &str) -> &str {
    match code {
        "c" => "char",
        "s" => "int2",
        "i" => "int4",
        "d" => "double",
        other => other,
    }
}

fn storage_name(code: &str) -> &str {
    match code {
        "p" => "plain",
        "e" => "external",
        "m" => "main",
        "x" => "extended",
        other => other,
    }
}

pub(super) fn base_type(record: &CatalogObjectRecord, def: &BaseTypeDefinition) -> String {
    let mut clauses = vec![
        format!("INPUT = {}", def.input),
        format!("OUTPUT = {}", def.output),
    ];
    let optional = [
        ("RECEIVE", &def.receive),
        ("SEND", &def.send),
        ("TYPMOD_IN", &def.modifier_input),
        ("TYPMOD_OUT", &def.modifier_output),
    ];
    for (clause, function) in optional {
        if !function.is_empty() {
            clauses.push(format!("{clause} = {function}"));
        }
    }
    if def.internal_length > 0 {
        clauses.push(format!("INTERNALLENGTH = {}", def.internal_length));
    }
    if def.passed_by_value {
        clauses.push("PASSEDBYVALUE".to_string());
    }
    if !def.alignment.is_empty() {
        clauses.push(format!("ALIGNMENT = {}", alignment_name(&def.alignment)));
    }
    if !def.storage.is_empty() && storage_name(&def.storage) != "plain" {
        clauses.push(format!("STORAGE = {}", storage_name(&def.storage)));
    }
    if !def.default_value.is_empty() {
        clauses.push(format!("DEFAULT = '{}'", def.default_value));
    }
    if !def.element.is_empty() {
        clauses.push(format!("ELEMENT = {}", def.element));
    }
    if !def.delimiter.is_empty() && def.delimiter != "," {
        clauses.push(format!("DELIMITER = '{}'", def.delimiter));
    }

    format!(
        "\n\nCREATE TYPE {} (\n\t{}\n);",
        qualified(record),
        clauses.join(",\n\t")
    )
}

pub(super) fn composite_type(record: &CatalogObjectRecord, def: &CompositeTypeDefinition) -> String {
    format!(
        "\n\nCREATE TYPE {} AS (\n{}\n);",
        qualified(record),
        def.attributes.join(",\n")
    )
}

pub(super) fn domain(record: &CatalogObjectRecord, def: &DomainDefinition) -> String {
    let mut text = format!("\n\nCREATE DOMAIN {} AS {}", qualified(record), def.base_type);
    if !def.default_value.is_empty() {
        text.push_str(&format!(" DEFAULT {}", def.default_value));
    }
    if def.not_null {
        text.push_str(" NOT NULL");
    }
    for constraint in &def.constraints {
        text.push_str(&format!("\n\t{constraint}"));
    }
    text.push(';');
    text
}

pub(super) fn enum_type(record: &CatalogObjectRecord, labels: &[String]) -> String {
    format!(
        "\n\nCREATE TYPE {} AS ENUM (\n\t{}\n);",
        qualified(record),
        labels.join(",\n\t")
    )
}

pub(super) fn function(record: &CatalogObjectRecord, def: &FunctionDefinition) -> String {
    format!(
        "\n\nCREATE FUNCTION {}({}) RETURNS {} AS $$\n{}\n$$\nLANGUAGE {};",
        qualified(record),
        def.arguments,
        def.result_type,
        def.body,
        def.language
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ObjectDetails;

    fn record(name: &str, details: ObjectDetails) -> CatalogObjectRecord {
        CatalogObjectRecord::new(1, "public", name, details)
    }

    #[test]
    fn test_base_type_clauses() {
        let def = BaseTypeDefinition {
            input: "public.money2_in".to_string(),
            output: "public.money2_out".to_string(),
            send: "public.money2_send".to_string(),
            internal_length: 8,
            passed_by_value: true,
            alignment: "d".to_string(),
            storage: "p".to_string(),
            delimiter: ";".to_string(),
            ..Default::default()
        };
        let rec = record("money2", ObjectDetails::BaseType(def.clone()));
        assert_eq!(
            base_type(&rec, &def),
            "\n\nCREATE TYPE public.money2 (\n\tINPUT = public.money2_in,\n\tOUTPUT = public.money2_out,\
             \n\tSEND = public.money2_send,\n\tINTERNALLENGTH = 8,\n\tPASSEDBYVALUE,\
             \n\tALIGNMENT = double,\n\tDELIMITER = ';'\n);"
        );
    }

    #[test]
    fn test_composite_and_enum() {
        let def = CompositeTypeDefinition {
            attributes: vec!["\tx integer".to_string(), "\ty public.money2".to_string()],
            ..Default::default()
        };
        let rec = record("pair", ObjectDetails::CompositeType(def.clone()));
        assert_eq!(
            composite_type(&rec, &def),
            "\n\nCREATE TYPE public.pair AS (\n\tx integer,\n\ty public.money2\n);"
        );

        let labels = vec!["'red'".to_string(), "'green'".to_string()];
        let rec = record("color", ObjectDetails::EnumType { labels: labels.clone() });
        assert_eq!(
            enum_type(&rec, &labels),
            "\n\nCREATE TYPE public.color AS ENUM (\n\t'red',\n\t'green'\n);"
        );
    }

    #[test]
    fn test_domain_clauses() {
        let def = DomainDefinition {
            base_type: "integer".to_string(),
            default_value: "1".to_string(),
            not_null: true,
            constraints: vec!["CONSTRAINT positive CHECK (VALUE > 0)".to_string()],
        };
        let rec = record("posint", ObjectDetails::DomainType(def.clone()));
        assert_eq!(
            domain(&rec, &def),
            "\n\nCREATE DOMAIN public.posint AS integer DEFAULT 1 NOT NULL\
             \n\tCONSTRAINT positive CHECK (VALUE > 0);"
        );
    }

    #[test]
    fn test_function_body() {
        let def = FunctionDefinition {
            arguments: "cstring".to_string(),
            result_type: "public.money2".to_string(),
            language: "c".to_string(),
            body: "money2_in".to_string(),
        };
        let rec = record("money2_in", ObjectDetails::Function(def.clone()));
        assert_eq!(
            function(&rec, &def),
            "\n\nCREATE FUNCTION public.money2_in(cstring) RETURNS public.money2 AS $$\nmoney2_in\n$$\nLANGUAGE c;"
        );
    }
}
