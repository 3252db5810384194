use reqguard_schema::{RequestValidator, SchemaDocument, ValidatorConfig};
use std::sync::Arc;

use crate::cmd::OperationsArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_operations, OutputFormat};

pub fn run(args: OperationsArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ValidatorConfig::default();
    let document = SchemaDocument::from_path(&args.schema, config.max_document_size)
        .map_err(|err| schema_error(&format!("failed reading {}", args.schema.display()), err))?;

    // Compile as well, so a listing is only printed for a usable schema.
    let validator = RequestValidator::new(Arc::new(document), config)
        .map_err(|err| schema_error("schema does not compile", err))?;
    tracing::debug!(
        title = validator.document().title(),
        version = validator.document().version(),
        openapi = validator.document().openapi(),
        "schema loaded"
    );

    print_operations(&validator.document().operations(), format);
    Ok(SUCCESS)
}
