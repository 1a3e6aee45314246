/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Invalid file extension.
    #[error("File does not have a valid extension: {0}")]
    InvalidFileExtension(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] ortho_image::ImageError),

    /// Error to decode or encode the image.
    #[error("Failed to decode or encode the image. {0}")]
    ImageCodecError(#[from] image::ImageError),

    /// The decoded pixel format has no counterpart in [`GenericImage`](crate::GenericImage).
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// The pixel buffer does not match the image size.
    #[error("Pixel buffer does not match the image size {0}x{1}")]
    BufferSizeMismatch(usize, usize),
}
