pub type SliderResult<T> = Result<T, SliderError>;

#[derive(thiserror::Error, Debug)]
pub enum SliderError {
    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("media load error: {0}")]
    MediaLoad(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("texture error: {0}")]
    Texture(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SliderError {
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn media_load(msg: impl Into<String>) -> Self {
        Self::MediaLoad(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn texture(msg: impl Into<String>) -> Self {
        Self::Texture(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(SliderError::manifest("x").to_string().contains("manifest error:"));
        assert!(SliderError::config("x").to_string().contains("config error:"));
        assert!(SliderError::media_load("x").to_string().contains("media load error:"));
        assert!(SliderError::decode("x").to_string().contains("decode error:"));
        assert!(SliderError::texture("x").to_string().contains("texture error:"));
        assert!(SliderError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn io_errors_convert() {
        let err: SliderError = std::io::Error::other("pipe closed").into();
        assert!(err.to_string().contains("pipe closed"));
    }
}
