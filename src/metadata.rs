//! File structure inspection
//!
//! The interactive workflow starts by looking at what a file contains before
//! deciding which axes to bind. These functions print that view: coordinate
//! axes on one side, data variables on the other, with the attributes that
//! matter for binding (units, long_name, _FillValue) surfaced inline.

use crate::errors::{GridViewsError, Result};
use netcdf::{AttributeValue, File};

/// Prints global attributes, coordinate axes and data variables of a file
pub fn print_structure(file: &File) -> Result<()> {
    println!("\n===== Global Attributes =====");
    for attr in file.attributes() {
        println!("- {}: {:?}", attr.name(), attr.value()?);
    }

    println!("\n===== Coordinate Axes =====");
    let mut dimensions: Vec<_> = file.dimensions().collect();
    dimensions.sort_by(|a, b| a.name().cmp(&b.name()));

    if dimensions.is_empty() {
        println!("   (none)");
    } else {
        for dim in dimensions {
            let length_info = if dim.is_unlimited() {
                format!("{} (unlimited)", dim.len())
            } else {
                dim.len().to_string()
            };
            let has_coords = file
                .variable(&dim.name())
                .map(|v| v.dimensions().len() == 1)
                .unwrap_or(false);
            let coord_note = if has_coords {
                ""
            } else {
                "  [no coordinate variable, index values assumed]"
            };
            println!("    {} = {}{}", dim.name(), length_info, coord_note);
        }
    }

    println!("\n===== Data Variables =====");
    let mut variables: Vec<_> = file
        .variables()
        .filter(|var| {
            let dims = var.dimensions();
            !(dims.len() == 1 && dims[0].name() == var.name())
        })
        .collect();
    variables.sort_by(|a, b| a.name().cmp(&b.name()));

    if variables.is_empty() {
        println!("   (none)");
    } else {
        for var in variables {
            let data_type = format!("{:?}", var.vartype()).to_lowercase();

            let dims: Vec<String> = var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect();
            let shape: Vec<String> = var
                .dimensions()
                .iter()
                .map(|d| d.len().to_string())
                .collect();

            if dims.is_empty() {
                println!("    {} ({}): scalar", var.name(), data_type);
            } else {
                println!(
                    "    {} ({}): [{}] = ({})",
                    var.name(),
                    data_type,
                    dims.join(", "),
                    shape.join(" x ")
                );
            }

            let mut key_attrs = Vec::new();
            if let Some(units) = str_attr(&var, "units") {
                key_attrs.push(format!("units: {}", units));
            }
            if let Some(long_name) = str_attr(&var, "long_name") {
                key_attrs.push(format!("long_name: {}", long_name));
            }
            if let Some(fill) = fill_attr(&var) {
                key_attrs.push(format!("_FillValue: {}", fill));
            }
            if !key_attrs.is_empty() {
                println!("      - {}", key_attrs.join(", "));
            }
        }
    }

    Ok(())
}

/// Describes one variable: data type, shape, dimension detail and attributes
pub fn describe_variable(file: &File, var_name: &str) -> Result<()> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridViewsError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    println!("\n Variable: {}", var_name);
    println!("={}", "=".repeat(var_name.len() + 11));

    let data_type = format!("{:?}", var.vartype()).to_lowercase();
    println!(" Data type: {}", data_type);

    let dims: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|dim| dim.len()).collect();

    if dims.is_empty() {
        println!(" Dimensions: (scalar)");
    } else {
        println!(" Dimensions: [{}]", dims.join(", "));
        println!(
            " Shape: ({})",
            shape
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" x ")
        );

        println!("\n Dimension detail:");
        for dim in var.dimensions().iter() {
            let length_info = if dim.is_unlimited() {
                format!("{} (unlimited)", dim.len())
            } else {
                dim.len().to_string()
            };
            println!("    {} = {}", dim.name(), length_info);
        }
    }

    let attributes: Vec<_> = var.attributes().collect();
    if attributes.is_empty() {
        println!("\n Attributes: (none)");
    } else {
        println!("\n Attributes:");
        for attr in attributes {
            match attr.value() {
                Ok(AttributeValue::Str(s)) => println!("    {}: \"{}\"", attr.name(), s),
                Ok(value) => println!("    {}: {:?}", attr.name(), value),
                Err(e) => println!("    {}: (error reading value: {})", attr.name(), e),
            }
        }
    }

    let total_elements: usize = shape.iter().product();
    let element_size = if data_type.contains("double") {
        8
    } else if data_type.contains("short") || data_type.contains("ushort") {
        2
    } else {
        4
    };
    let total_bytes = total_elements * element_size;

    println!("\n In-memory estimate:");
    println!("    Total elements: {}", total_elements);
    if total_bytes < 1024 * 1024 {
        println!("    Size: {:.2} KB", total_bytes as f64 / 1024.0);
    } else {
        println!(
            "    Size: {:.2} MB",
            total_bytes as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

fn str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn fill_attr(var: &netcdf::Variable) -> Option<String> {
    match var.attribute("_FillValue")?.value().ok()? {
        AttributeValue::Float(v) => Some(v.to_string()),
        AttributeValue::Double(v) => Some(v.to_string()),
        AttributeValue::Int(v) => Some(v.to_string()),
        AttributeValue::Short(v) => Some(v.to_string()),
        _ => None,
    }
}
