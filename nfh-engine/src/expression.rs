//! Earth Engine expression graphs.
//!
//! The REST API evaluates computations described as a DAG of function
//! invocations. Each builder here returns a complete `{"values", "result"}`
//! expression for one request; nodes are inlined except for mapped function
//! bodies, which the API requires to be referenced by key.

use crate::query::{CollectionQuery, CompositeImage, ReduceParams, TIME_START_PROPERTY};
use nfh_geo::AreaOfInterest;
use nfh_utils::dates::format_date;
use serde_json::{json, Map, Value};

/// Name bound to the image inside `Collection.map`.
const MAP_VARIABLE: &str = "_MAPPING_VAR_0_0";

fn constant(value: impl Into<Value>) -> Value {
    json!({ "constantValue": value.into() })
}

fn invoke(function: &str, arguments: Vec<(&str, Value)>) -> Value {
    let arguments: Map<String, Value> = arguments
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

fn image_constant(value: impl Into<Value>) -> Value {
    invoke("Image.constant", vec![("value", constant(value))])
}

/// Accumulates named values and produces the final expression document.
#[derive(Debug, Default)]
struct ExpressionBuilder {
    values: Map<String, Value>,
}

impl ExpressionBuilder {
    fn push(&mut self, node: Value) -> String {
        let key = self.values.len().to_string();
        self.values.insert(key.clone(), node);
        key
    }

    fn finish(mut self, result: Value) -> Value {
        let key = self.push(result);
        json!({ "values": self.values, "result": key })
    }
}

/// Disk geometry: the AOI center buffered by its radius in meters.
pub fn area_geometry(area: &AreaOfInterest) -> Value {
    let point = invoke(
        "GeometryConstructors.Point",
        vec![(
            "coordinates",
            constant(json!([area.center.lon, area.center.lat])),
        )],
    );
    invoke(
        "Geometry.buffer",
        vec![("geometry", point), ("distance", constant(area.radius_m()))],
    )
}

fn filtered_collection(query: &CollectionQuery) -> Value {
    let geometry = area_geometry(&query.area);
    let collection = invoke(
        "ImageCollection.load",
        vec![("id", constant(query.collection.as_str()))],
    );
    let by_bounds = invoke(
        "Collection.filter",
        vec![
            ("collection", collection),
            (
                "filter",
                invoke(
                    "Filter.intersects",
                    vec![("leftField", constant(".all")), ("rightValue", geometry)],
                ),
            ),
        ],
    );
    let date_range = invoke(
        "DateRange",
        vec![
            ("start", constant(format_date(&query.range.start()))),
            ("end", constant(format_date(&query.range.end()))),
        ],
    );
    let by_date = invoke(
        "Collection.filter",
        vec![
            ("collection", by_bounds),
            (
                "filter",
                invoke(
                    "Filter.dateRangeContains",
                    vec![
                        ("leftValue", date_range),
                        ("rightField", constant(TIME_START_PROPERTY)),
                    ],
                ),
            ),
        ],
    );
    invoke(
        "Collection.filter",
        vec![
            ("collection", by_date),
            (
                "filter",
                invoke(
                    "Filter.lessThan",
                    vec![
                        ("leftField", constant(query.cloud_property.as_str())),
                        ("rightValue", constant(query.max_cloud_pct)),
                    ],
                ),
            ),
        ],
    )
}

/// Body of the per-image cloud mask: clear where both QA bits are zero,
/// reflectance divided by the scale factor, acquisition time preserved.
fn cloud_mask_body(query: &CollectionQuery) -> Value {
    let image = json!({ "argumentReference": MAP_VARIABLE });
    let qa = invoke(
        "Image.select",
        vec![
            ("input", image.clone()),
            ("bandSelectors", constant(json!([query.mask.qa_band]))),
        ],
    );
    let bit_is_clear = |bit_mask: u16| {
        invoke(
            "Image.eq",
            vec![
                (
                    "image1",
                    invoke(
                        "Image.bitwiseAnd",
                        vec![("image1", qa.clone()), ("image2", image_constant(bit_mask))],
                    ),
                ),
                ("image2", image_constant(0)),
            ],
        )
    };
    let mask = invoke(
        "Image.and",
        vec![
            ("image1", bit_is_clear(query.mask.cloud_bit_mask())),
            ("image2", bit_is_clear(query.mask.cirrus_bit_mask())),
        ],
    );
    let masked = invoke(
        "Image.updateMask",
        vec![("image", image.clone()), ("mask", mask)],
    );
    let scaled = invoke(
        "Image.divide",
        vec![("image1", masked), ("image2", image_constant(query.scale_factor))],
    );
    invoke(
        "Element.copyProperties",
        vec![
            ("destination", scaled),
            ("source", image),
            ("properties", constant(json!([TIME_START_PROPERTY]))),
        ],
    )
}

fn composite_node(builder: &mut ExpressionBuilder, query: &CollectionQuery) -> Value {
    let body = builder.push(cloud_mask_body(query));
    let masked = invoke(
        "Collection.map",
        vec![
            ("collection", filtered_collection(query)),
            (
                "baseAlgorithm",
                json!({
                    "functionDefinitionValue": {
                        "argumentNames": [MAP_VARIABLE],
                        "body": body,
                    }
                }),
            ),
        ],
    );
    let median = invoke("reduce.median", vec![("collection", masked)]);
    let clipped = invoke(
        "Image.clip",
        vec![("input", median), ("geometry", area_geometry(&query.area))],
    );
    let index = invoke(
        "Image.rename",
        vec![
            (
                "input",
                invoke(
                    "Image.normalizedDifference",
                    vec![
                        ("input", clipped.clone()),
                        (
                            "bandNames",
                            constant(json!([query.nir_band, query.red_band])),
                        ),
                    ],
                ),
            ),
            ("names", constant(json!([query.index_band]))),
        ],
    );
    invoke(
        "Image.addBands",
        vec![("dstImg", clipped), ("srcImg", index)],
    )
}

/// Number of scenes passing the area, date and cloud filters.
pub fn image_count_expression(query: &CollectionQuery) -> Value {
    let builder = ExpressionBuilder::default();
    let size = invoke(
        "Collection.size",
        vec![("collection", filtered_collection(query))],
    );
    builder.finish(size)
}

/// Mean of the index band over `area`, as a single number (or null).
pub fn reduce_mean_expression(
    image: &CompositeImage,
    area: &AreaOfInterest,
    params: &ReduceParams,
) -> Value {
    let mut builder = ExpressionBuilder::default();
    let composite = composite_node(&mut builder, &image.query);
    let band = image.index_band();
    let selected = invoke(
        "Image.select",
        vec![
            ("input", composite),
            ("bandSelectors", constant(json!([band]))),
        ],
    );
    let stats = invoke(
        "Image.reduceRegion",
        vec![
            ("image", selected),
            ("reducer", invoke("Reducer.mean", vec![])),
            ("geometry", area_geometry(area)),
            ("scale", constant(params.scale_m)),
            ("maxPixels", constant(params.max_pixels)),
        ],
    );
    let value = invoke(
        "Dictionary.get",
        vec![("dictionary", stats), ("key", constant(band))],
    );
    builder.finish(value)
}

/// The index band alone, ready to be rendered as map tiles.
pub fn index_band_expression(image: &CompositeImage) -> Value {
    let mut builder = ExpressionBuilder::default();
    let composite = composite_node(&mut builder, &image.query);
    let selected = invoke(
        "Image.select",
        vec![
            ("input", composite),
            ("bandSelectors", constant(json!([image.index_band()]))),
        ],
    );
    builder.finish(selected)
}
