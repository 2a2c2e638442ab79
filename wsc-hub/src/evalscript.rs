/// Scene classification values treated as obstructed: cloud shadow,
/// medium and high probability cloud.
pub const OBSTRUCTED_SCL_CLASSES: [u8; 3] = [3, 8, 9];

/// Epsilon in the index denominator so dark pixels never divide by zero.
pub const INDEX_EPSILON: f64 = 0.0001;

/// Evaluation script producing a one-band UINT8 water mask.
///
/// Obstructed pixels map to 0, everything else to 1 when the
/// green/near-infrared normalized difference exceeds `threshold`.
pub fn water_mask_evalscript(threshold: f64) -> String {
    let classes = OBSTRUCTED_SCL_CLASSES
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"//VERSION=3
function setup() {{
  return {{
    input: ["B03", "B08", "SCL"],
    output: {{ bands: 1, sampleType: "UINT8" }}
  }};
}}

function evaluatePixel(sample) {{
  if ([{classes}].includes(sample.SCL)) {{
    return [0];
  }}
  let index = (sample.B03 - sample.B08) / (sample.B03 + sample.B08 + {INDEX_EPSILON});
  return [index > {threshold:?} ? 1 : 0];
}}
"#
    )
}
