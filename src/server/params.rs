//! Query-string parsing for `/resized` and `/guess`.
//!
//! Empty values count as absent. When both `ratio` and `pixelwidth` are
//! present the ratio is still validated, but the pixel width wins; when both
//! `imgid` and `sample` are present the stored image wins.

use guess_scale::ResizeSpec;
use serde::Deserialize;

use crate::error::{GuessError, GuessResult};
use crate::samples::SampleLibrary;
use crate::service::{ImageSource, ResizeRequest};

/// Raw query parameters, exactly as the browser sends them.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResizeQuery {
    pub ratio: Option<String>,
    pub pixelwidth: Option<String>,
    pub sample: Option<String>,
    pub imgid: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TryFrom<&ResizeQuery> for ResizeRequest {
    type Error = GuessError;

    fn try_from(query: &ResizeQuery) -> GuessResult<Self> {
        let ratio = present(&query.ratio);
        let pixelwidth = present(&query.pixelwidth);
        if ratio.is_none() && pixelwidth.is_none() {
            return Err(size_required());
        }

        let ratio = ratio.map(parse_ratio).transpose()?;

        let sample = present(&query.sample);
        if let Some(name) = sample {
            SampleLibrary::validate(name)?;
        }
        let source = match (present(&query.imgid), sample) {
            (Some(id), _) => ImageSource::Stored(id.to_string()),
            (None, Some(name)) => ImageSource::Sample(name.to_string()),
            (None, None) => {
                return Err(GuessError::invalid_spec(
                    "imgid",
                    "sample or imgid is required",
                ));
            }
        };

        let spec = match (pixelwidth, ratio) {
            (Some(width), _) => ResizeSpec::Width(parse_width(width)?),
            (None, Some(ratio)) => ResizeSpec::Ratio(ratio),
            (None, None) => return Err(size_required()),
        };

        Ok(ResizeRequest { source, spec })
    }
}

fn size_required() -> GuessError {
    GuessError::invalid_spec("ratio", "ratio or pixelwidth is required")
}

fn parse_ratio(raw: &str) -> GuessResult<f64> {
    let ratio: f64 = raw
        .parse()
        .map_err(|_| GuessError::invalid_spec("ratio", "ratio must be a number"))?;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(GuessError::invalid_spec(
            "ratio",
            "ratio must be between 0.0 and 1.0",
        ));
    }
    Ok(ratio)
}

fn parse_width(raw: &str) -> GuessResult<u32> {
    raw.parse().map_err(|_| {
        GuessError::invalid_spec("pixelwidth", "pixelwidth must be an integer number")
    })
}
