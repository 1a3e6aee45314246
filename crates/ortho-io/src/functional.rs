use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};
use ortho_image::{Image, ImageSize};

use crate::error::IoError;

/// A generic image type that can be any of the supported image formats.
#[derive(Clone, Debug, PartialEq)]
pub enum GenericImage {
    /// 8-bit grayscale image
    L8(Image<u8, 1>),
    /// 8-bit grayscale image with alpha channel
    La8(Image<u8, 2>),
    /// 8-bit RGB image
    Rgb8(Image<u8, 3>),
    /// 8-bit RGB image with alpha channel
    Rgba8(Image<u8, 4>),
    /// 16-bit grayscale image
    L16(Image<u16, 1>),
    /// 16-bit grayscale image with alpha channel
    La16(Image<u16, 2>),
    /// 16-bit RGB image
    Rgb16(Image<u16, 3>),
    /// 16-bit RGB image with alpha channel
    Rgba16(Image<u16, 4>),
    /// 32-bit float RGB image
    Rgb32F(Image<f32, 3>),
    /// 32-bit float RGB image with alpha channel
    Rgba32F(Image<f32, 4>),
}

macro_rules! for_each_variant {
    ($value:expr, $image:ident => $body:expr) => {
        match $value {
            GenericImage::L8($image) => $body,
            GenericImage::La8($image) => $body,
            GenericImage::Rgb8($image) => $body,
            GenericImage::Rgba8($image) => $body,
            GenericImage::L16($image) => $body,
            GenericImage::La16($image) => $body,
            GenericImage::Rgb16($image) => $body,
            GenericImage::Rgba16($image) => $body,
            GenericImage::Rgb32F($image) => $body,
            GenericImage::Rgba32F($image) => $body,
        }
    };
}

impl GenericImage {
    /// The size of the wrapped image.
    pub fn size(&self) -> ImageSize {
        for_each_variant!(self, image => image.size())
    }

    /// The number of channels of the wrapped image.
    pub fn num_channels(&self) -> usize {
        for_each_variant!(self, image => image.num_channels())
    }

    /// A short name of the pixel format, e.g. `"rgb8"`.
    pub fn format_name(&self) -> &'static str {
        match self {
            GenericImage::L8(_) => "l8",
            GenericImage::La8(_) => "la8",
            GenericImage::Rgb8(_) => "rgb8",
            GenericImage::Rgba8(_) => "rgba8",
            GenericImage::L16(_) => "l16",
            GenericImage::La16(_) => "la16",
            GenericImage::Rgb16(_) => "rgb16",
            GenericImage::Rgba16(_) => "rgba16",
            GenericImage::Rgb32F(_) => "rgb32f",
            GenericImage::Rgba32F(_) => "rgba32f",
        }
    }
}

/// Reads an image from the given file path.
///
/// The method tries to read from any image format supported by the image crate,
/// guessing the format from the file contents.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An image containing the image data, in the pixel format stored in the file.
pub fn read_image_any(file_path: impl AsRef<Path>) -> Result<GenericImage, IoError> {
    let file_path = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let img = image::ImageReader::open(&file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let image = match img {
        DynamicImage::ImageLuma8(buf) => GenericImage::L8(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageLumaA8(buf) => GenericImage::La8(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageRgb8(buf) => GenericImage::Rgb8(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageRgba8(buf) => GenericImage::Rgba8(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageLuma16(buf) => GenericImage::L16(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageLumaA16(buf) => GenericImage::La16(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageRgb16(buf) => GenericImage::Rgb16(Image::new(size, buf.into_raw())?),
        DynamicImage::ImageRgba16(buf) => {
            GenericImage::Rgba16(Image::new(size, buf.into_raw())?)
        }
        DynamicImage::ImageRgb32F(buf) => {
            GenericImage::Rgb32F(Image::new(size, buf.into_raw())?)
        }
        DynamicImage::ImageRgba32F(buf) => {
            GenericImage::Rgba32F(Image::new(size, buf.into_raw())?)
        }
        other => {
            return Err(IoError::UnsupportedImageFormat(format!(
                "{:?}",
                other.color()
            )))
        }
    };

    log::debug!(
        "read {} image of size {} from {}",
        image.format_name(),
        size,
        file_path.display()
    );

    Ok(image)
}

fn to_buffer<P: Pixel, const C: usize>(
    image: &Image<P::Subpixel, C>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, IoError> {
    let size = image.size();
    let mismatch = || IoError::BufferSizeMismatch(size.width, size.height);
    let width = u32::try_from(size.width).map_err(|_| mismatch())?;
    let height = u32::try_from(size.height).map_err(|_| mismatch())?;
    ImageBuffer::from_raw(width, height, image.as_slice().to_vec()).ok_or_else(mismatch)
}

fn save_dynamic(file_path: &Path, img: DynamicImage) -> Result<(), IoError> {
    if file_path.extension().is_none() {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }
    img.save(file_path)?;
    Ok(())
}

/// Writes an image to the given file path.
///
/// The encoder is picked from the file extension.
///
/// # Arguments
///
/// * `file_path` - The path to the output file.
/// * `image` - The image to encode.
pub fn write_image_any(file_path: impl AsRef<Path>, image: &GenericImage) -> Result<(), IoError> {
    let img = match image {
        GenericImage::L8(img) => DynamicImage::ImageLuma8(to_buffer::<Luma<u8>, 1>(img)?),
        GenericImage::La8(img) => DynamicImage::ImageLumaA8(to_buffer::<LumaA<u8>, 2>(img)?),
        GenericImage::Rgb8(img) => DynamicImage::ImageRgb8(to_buffer::<Rgb<u8>, 3>(img)?),
        GenericImage::Rgba8(img) => DynamicImage::ImageRgba8(to_buffer::<Rgba<u8>, 4>(img)?),
        GenericImage::L16(img) => DynamicImage::ImageLuma16(to_buffer::<Luma<u16>, 1>(img)?),
        GenericImage::La16(img) => DynamicImage::ImageLumaA16(to_buffer::<LumaA<u16>, 2>(img)?),
        GenericImage::Rgb16(img) => DynamicImage::ImageRgb16(to_buffer::<Rgb<u16>, 3>(img)?),
        GenericImage::Rgba16(img) => DynamicImage::ImageRgba16(to_buffer::<Rgba<u16>, 4>(img)?),
        GenericImage::Rgb32F(img) => DynamicImage::ImageRgb32F(to_buffer::<Rgb<f32>, 3>(img)?),
        GenericImage::Rgba32F(img) => {
            DynamicImage::ImageRgba32F(to_buffer::<Rgba<f32>, 4>(img)?)
        }
    };
    save_dynamic(file_path.as_ref(), img)
}

/// Writes an 8-bit grayscale image, picking the encoder from the file extension.
pub fn write_image_gray8(file_path: impl AsRef<Path>, image: &Image<u8, 1>) -> Result<(), IoError> {
    save_dynamic(
        file_path.as_ref(),
        DynamicImage::ImageLuma8(to_buffer::<Luma<u8>, 1>(image)?),
    )
}

/// Writes an 8-bit RGB image, picking the encoder from the file extension.
pub fn write_image_rgb8(file_path: impl AsRef<Path>, image: &Image<u8, 3>) -> Result<(), IoError> {
    save_dynamic(
        file_path.as_ref(),
        DynamicImage::ImageRgb8(to_buffer::<Rgb<u8>, 3>(image)?),
    )
}

/// Writes an 8-bit RGBA image, picking the encoder from the file extension.
pub fn write_image_rgba8(file_path: impl AsRef<Path>, image: &Image<u8, 4>) -> Result<(), IoError> {
    save_dynamic(
        file_path.as_ref(),
        DynamicImage::ImageRgba8(to_buffer::<Rgba<u8>, 4>(image)?),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient<const C: usize>(width: usize, height: usize) -> Result<Image<u8, C>, IoError> {
        let size = ImageSize { width, height };
        Ok(Image::new(
            size,
            (0..size.area() * C).map(|v| (v * 13 % 256) as u8).collect(),
        )?)
    }

    #[test]
    fn read_write_gray8_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray.png");

        let image = gradient::<1>(9, 7)?;
        write_image_gray8(&file_path, &image)?;
        assert!(file_path.exists(), "File does not exist: {:?}", file_path);

        let back = read_image_any(&file_path)?;
        assert_eq!(back.size(), image.size());
        assert_eq!(back.num_channels(), 1);
        assert_eq!(back, GenericImage::L8(image));
        Ok(())
    }

    #[test]
    fn read_write_rgb8_tiff() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgb.tif");

        let image = gradient::<3>(5, 6)?;
        write_image_rgb8(&file_path, &image)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back.format_name(), "rgb8");
        assert_eq!(back, GenericImage::Rgb8(image));
        Ok(())
    }

    #[test]
    fn read_write_rgba8_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgba.png");

        let image = gradient::<4>(3, 4)?;
        write_image_rgba8(&file_path, &image)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back, GenericImage::Rgba8(image));
        Ok(())
    }

    #[test]
    fn read_write_gray16_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray16.png");

        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let image = GenericImage::L16(Image::new(
            size,
            (0..12u16).map(|v| v * 5000).collect(),
        )?);
        write_image_any(&file_path, &image)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back, image);
        Ok(())
    }

    #[test]
    fn missing_file() {
        let result = read_image_any("/definitely/not/here.tif");
        assert!(matches!(result, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn missing_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("no_extension");

        let image = gradient::<1>(2, 2)?;
        let result = write_image_gray8(&file_path, &image);
        assert!(matches!(result, Err(IoError::InvalidFileExtension(_))));
        Ok(())
    }
}
