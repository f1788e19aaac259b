use crate::error::PipelineError;

/// Represents a registered camera model.
///
/// The numeric ids and names match the ones stored in a COLMAP database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraModelId {
    /// Simple pinhole camera model
    SimplePinhole = 0,
    /// Pinhole camera model
    Pinhole = 1,
    /// Simplified radial camera model
    SimpleRadial = 2,
    /// Radial camera model
    Radial = 3,
    /// OpenCV camera model
    OpenCV = 4,
    /// OpenCV fisheye camera model
    OpenCVFisheye = 5,
    /// Full OpenCV camera model
    FullOpenCV = 6,
    /// Field of view camera model
    FOV = 7,
    /// Simple radial fisheye camera model
    SimpleRadialFisheye = 8,
    /// Radial fisheye camera model
    RadialFisheye = 9,
    /// Thin prism fisheye camera model
    ThinPrismFisheye = 10,
}

impl CameraModelId {
    /// All the registered camera models, ordered by id.
    pub const ALL: [CameraModelId; 11] = [
        CameraModelId::SimplePinhole,
        CameraModelId::Pinhole,
        CameraModelId::SimpleRadial,
        CameraModelId::Radial,
        CameraModelId::OpenCV,
        CameraModelId::OpenCVFisheye,
        CameraModelId::FullOpenCV,
        CameraModelId::FOV,
        CameraModelId::SimpleRadialFisheye,
        CameraModelId::RadialFisheye,
        CameraModelId::ThinPrismFisheye,
    ];

    /// Looks up a camera model by its name, e.g. `SIMPLE_PINHOLE`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SIMPLE_PINHOLE" => Some(Self::SimplePinhole),
            "PINHOLE" => Some(Self::Pinhole),
            "SIMPLE_RADIAL" => Some(Self::SimpleRadial),
            "RADIAL" => Some(Self::Radial),
            "OPENCV" => Some(Self::OpenCV),
            "OPENCV_FISHEYE" => Some(Self::OpenCVFisheye),
            "FULL_OPENCV" => Some(Self::FullOpenCV),
            "FOV" => Some(Self::FOV),
            "SIMPLE_RADIAL_FISHEYE" => Some(Self::SimpleRadialFisheye),
            "RADIAL_FISHEYE" => Some(Self::RadialFisheye),
            "THIN_PRISM_FISHEYE" => Some(Self::ThinPrismFisheye),
            _ => None,
        }
    }

    /// Returns true if a camera model with the given name is registered.
    pub fn exists(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    /// The numeric id of the model.
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// The registered name of the model.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimplePinhole => "SIMPLE_PINHOLE",
            Self::Pinhole => "PINHOLE",
            Self::SimpleRadial => "SIMPLE_RADIAL",
            Self::Radial => "RADIAL",
            Self::OpenCV => "OPENCV",
            Self::OpenCVFisheye => "OPENCV_FISHEYE",
            Self::FullOpenCV => "FULL_OPENCV",
            Self::FOV => "FOV",
            Self::SimpleRadialFisheye => "SIMPLE_RADIAL_FISHEYE",
            Self::RadialFisheye => "RADIAL_FISHEYE",
            Self::ThinPrismFisheye => "THIN_PRISM_FISHEYE",
        }
    }

    /// Human readable description of the parameter layout.
    pub fn params_info(&self) -> &'static str {
        match self {
            Self::SimplePinhole => "f, cx, cy",
            Self::Pinhole => "fx, fy, cx, cy",
            Self::SimpleRadial | Self::SimpleRadialFisheye => "f, cx, cy, k",
            Self::Radial | Self::RadialFisheye => "f, cx, cy, k1, k2",
            Self::OpenCV => "fx, fy, cx, cy, k1, k2, p1, p2",
            Self::OpenCVFisheye => "fx, fy, cx, cy, k1, k2, k3, k4",
            Self::FullOpenCV => "fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6",
            Self::FOV => "fx, fy, cx, cy, omega",
            Self::ThinPrismFisheye => "fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, sx1, sy1",
        }
    }

    /// Number of parameters the model expects.
    pub fn num_params(&self) -> usize {
        match self {
            Self::SimplePinhole => 3,
            Self::Pinhole | Self::SimpleRadial | Self::SimpleRadialFisheye => 4,
            Self::Radial | Self::FOV | Self::RadialFisheye => 5,
            Self::OpenCV | Self::OpenCVFisheye => 8,
            Self::FullOpenCV | Self::ThinPrismFisheye => 12,
        }
    }

    /// Indices of the focal length parameters.
    pub fn focal_length_idxs(&self) -> &'static [usize] {
        match self {
            Self::SimplePinhole
            | Self::SimpleRadial
            | Self::Radial
            | Self::SimpleRadialFisheye
            | Self::RadialFisheye => &[0],
            _ => &[0, 1],
        }
    }

    /// Checks a parameter vector against the model.
    ///
    /// An empty vector is valid and means the model defaults are used. Otherwise
    /// the vector must have exactly [`Self::num_params`] finite values with
    /// strictly positive focal lengths.
    pub fn verify_params(&self, params: &[f64]) -> bool {
        if params.is_empty() {
            return true;
        }

        if params.len() != self.num_params() || params.iter().any(|p| !p.is_finite()) {
            return false;
        }

        self.focal_length_idxs().iter().all(|&i| params[i] > 0.0)
    }
}

impl std::fmt::Display for CameraModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CameraModelId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| PipelineError::UnknownCameraModel(s.to_string()))
    }
}

/// Parses a comma (or semicolon) separated list of numbers.
///
/// Tokens are trimmed and empty tokens are skipped, so `""` and `" , "` both
/// yield an empty vector. Returns `None` if any token is not a number.
pub fn parse_camera_params(params: &str) -> Option<Vec<f64>> {
    params
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Validates the camera parameters of a camera model given by name.
///
/// # Arguments
///
/// * `camera_model` - The name of the camera model, e.g. `SIMPLE_RADIAL`.
/// * `camera_params` - The raw parameter string, e.g. `"800, 320, 240, 0.1"`.
///
/// # Returns
///
/// The resolved camera model if the parameters are empty or fit the model.
pub fn check_camera_params(
    camera_model: &str,
    camera_params: &str,
) -> Result<CameraModelId, PipelineError> {
    let model_id = camera_model.parse::<CameraModelId>()?;

    let valid = parse_camera_params(camera_params)
        .map(|params| model_id.verify_params(&params))
        .unwrap_or(false);

    if !valid {
        return Err(PipelineError::InvalidCameraParams {
            model: model_id.name().to_string(),
            params: camera_params.to_string(),
            expected: model_id.params_info(),
        });
    }

    Ok(model_id)
}

/// Returns whether the camera parameters are valid for the camera model.
///
/// On failure the reason is reported through the `log` error channel.
pub fn verify_camera_params(camera_model: &str, camera_params: &str) -> bool {
    match check_camera_params(camera_model, camera_params) {
        Ok(_) => true,
        Err(e) => {
            log::error!("{e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for model in CameraModelId::ALL {
            assert_eq!(CameraModelId::from_name(model.name()), Some(model));
            assert_eq!(CameraModelId::ALL[model.id() as usize], model);
        }
    }

    #[test]
    fn test_params_info_matches_arity() {
        for model in CameraModelId::ALL {
            assert_eq!(model.params_info().split(", ").count(), model.num_params());
        }
    }

    #[test]
    fn test_unknown_model() {
        assert!(!CameraModelId::exists("NONEXISTENT"));
        assert!(!CameraModelId::exists("simple_pinhole"));
        assert!(!verify_camera_params("NONEXISTENT", ""));
        assert!(!verify_camera_params("NONEXISTENT", "100, 50, 50"));
        assert!(matches!(
            check_camera_params("NONEXISTENT", "1, 2, 3"),
            Err(PipelineError::UnknownCameraModel(_))
        ));
    }

    #[test]
    fn test_empty_params_always_valid() {
        for model in CameraModelId::ALL {
            assert!(verify_camera_params(model.name(), ""));
            assert!(verify_camera_params(model.name(), " , "));
        }
    }

    #[test]
    fn test_parse_camera_params() {
        assert_eq!(parse_camera_params(""), Some(vec![]));
        assert_eq!(
            parse_camera_params("800, 320;240 ,"),
            Some(vec![800.0, 320.0, 240.0])
        );
        assert_eq!(parse_camera_params("800, abc"), None);
    }

    #[test]
    fn test_arity() {
        assert!(verify_camera_params("SIMPLE_PINHOLE", "800, 320, 240"));
        assert!(!verify_camera_params("SIMPLE_PINHOLE", "800, 320"));
        assert!(!verify_camera_params("SIMPLE_PINHOLE", "800, 320, 240, 0.1"));
        assert!(verify_camera_params("PINHOLE", "800, 810, 320, 240"));
        assert!(verify_camera_params(
            "OPENCV",
            "800, 810, 320, 240, 0.1, -0.01, 0.001, 0.002"
        ));
    }

    #[test]
    fn test_domain() {
        assert!(!verify_camera_params("SIMPLE_PINHOLE", "0, 320, 240"));
        assert!(!verify_camera_params("PINHOLE", "800, -1, 320, 240"));
        assert!(!verify_camera_params("SIMPLE_PINHOLE", "NaN, 320, 240"));
        assert!(!verify_camera_params("SIMPLE_PINHOLE", "800, inf, 240"));
        assert!(!verify_camera_params("SIMPLE_PINHOLE", "800, x, 240"));
        // the principal point and distortion may be negative
        assert!(verify_camera_params("SIMPLE_RADIAL", "800, -320, 240, -0.2"));
    }

    #[test]
    fn test_check_is_pure() {
        let a = check_camera_params("RADIAL", "500, 1, 2, 0.1, 0.2");
        let b = check_camera_params("RADIAL", "500, 1, 2, 0.1, 0.2");
        assert_eq!(a.as_ref().ok(), b.as_ref().ok());
        assert_eq!(a.ok(), Some(CameraModelId::Radial));
    }
}
