//! Filtered views over a capture-session result.
//!
//! All filtering is synchronous and preserves the original attachment order;
//! the only asynchronous steps are the decode/crop stages at the end of the
//! image pipelines. Attachments whose bytes fail to decode are skipped, not
//! errored.

use faceflow_sdk::{
    Attachment, Bearing, BoundingBox, Face, ImageRef, RecognizableFace, SessionResult,
};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use image::DynamicImage;

use crate::adapter::run_blocking;
use crate::engine::FaceFlow;
use crate::error::FlowError;
use crate::imaging;

/// One qualifying attachment's face paired with its image and pose label.
#[derive(Debug, Clone)]
pub struct FaceCapture<F, I> {
    pub face: F,
    pub image: I,
    pub bearing: Bearing,
}

fn bearing_matches(attachment: &Attachment, bearing: Option<Bearing>) -> bool {
    bearing.map_or(true, |b| attachment.bearing == b)
}

fn qualifying_refs(result: &SessionResult, bearing: Option<Bearing>) -> Vec<ImageRef> {
    result
        .attachments
        .iter()
        .filter(|attachment| bearing_matches(attachment, bearing))
        .filter_map(|attachment| attachment.image.clone())
        .collect()
}

/// Decode each image reference, dropping the ones that fail to decode.
fn decode_stream(refs: Vec<ImageRef>) -> BoxStream<'static, Result<DynamicImage, FlowError>> {
    stream::iter(refs)
        .then(|image_ref| async move {
            run_blocking(move || imaging::decode_bytes(&image_ref.data)).await
        })
        .filter_map(|decoded| future::ready(decoded.ok()))
        .map(Ok)
        .boxed()
}

impl FaceFlow {
    /// References to the result's images, optionally filtered by bearing.
    pub fn image_refs_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<ImageRef, FlowError>> {
        stream::iter(qualifying_refs(result, bearing).into_iter().map(Ok)).boxed()
    }

    /// The result's images, decoded.
    pub fn images_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<DynamicImage, FlowError>> {
        decode_stream(qualifying_refs(result, bearing))
    }

    /// The result's images, decoded and cropped to each attachment's face.
    pub fn cropped_face_images_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<DynamicImage, FlowError>> {
        let items: Vec<(ImageRef, BoundingBox)> = result
            .attachments
            .iter()
            .filter(|attachment| bearing_matches(attachment, bearing))
            .filter_map(|attachment| {
                attachment
                    .image
                    .clone()
                    .map(|image_ref| (image_ref, attachment.face.face().bounds.clone()))
            })
            .collect();

        stream::iter(items)
            .then(|(image_ref, bounds)| async move {
                run_blocking(move || {
                    let decoded = imaging::decode_bytes(&image_ref.data)?;
                    imaging::crop_to_bounds(&decoded, &bounds)
                })
                .await
            })
            .filter_map(|cropped| future::ready(cropped.ok()))
            .map(Ok)
            .boxed()
    }

    /// Faces of the result's attachments, optionally filtered by bearing.
    pub fn faces_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<Face, FlowError>> {
        let faces: Vec<Face> = result
            .attachments
            .iter()
            .filter(|attachment| bearing_matches(attachment, bearing))
            .map(|attachment| attachment.face.face().clone())
            .collect();
        stream::iter(faces.into_iter().map(Ok)).boxed()
    }

    /// Recognition-capable faces of the result's attachments.
    pub fn recognizable_faces_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<RecognizableFace, FlowError>> {
        let faces = result.faces_suitable_for_recognition(bearing);
        stream::iter(faces.into_iter().map(Ok)).boxed()
    }

    /// Each qualifying attachment's face paired with its image reference.
    pub fn faces_and_images_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<FaceCapture<Face, ImageRef>, FlowError>> {
        let pairs: Vec<FaceCapture<Face, ImageRef>> = result
            .attachments
            .iter()
            .filter(|attachment| bearing_matches(attachment, bearing))
            .filter_map(|attachment| {
                attachment.image.clone().map(|image| FaceCapture {
                    face: attachment.face.face().clone(),
                    image,
                    bearing: attachment.bearing,
                })
            })
            .collect();
        stream::iter(pairs.into_iter().map(Ok)).boxed()
    }

    /// Each qualifying attachment's recognition-capable face paired with its
    /// image reference.
    pub fn recognizable_faces_and_images_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<FaceCapture<RecognizableFace, ImageRef>, FlowError>> {
        let pairs: Vec<FaceCapture<RecognizableFace, ImageRef>> = result
            .attachments
            .iter()
            .filter(|attachment| bearing_matches(attachment, bearing))
            .filter_map(|attachment| {
                let recognizable = attachment.face.recognizable()?.clone();
                let image = attachment.image.clone()?;
                Some(FaceCapture {
                    face: recognizable,
                    image,
                    bearing: attachment.bearing,
                })
            })
            .collect();
        stream::iter(pairs.into_iter().map(Ok)).boxed()
    }

    /// Each qualifying attachment's face paired with its image decoded and
    /// cropped to that face.
    pub fn faces_and_cropped_images_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<FaceCapture<Face, DynamicImage>, FlowError>> {
        let pairs: Vec<(Face, ImageRef, Bearing)> = result
            .attachments
            .iter()
            .filter(|attachment| bearing_matches(attachment, bearing))
            .filter_map(|attachment| {
                attachment.image.clone().map(|image| {
                    (attachment.face.face().clone(), image, attachment.bearing)
                })
            })
            .collect();
        crop_pairs(pairs)
    }

    /// Each qualifying attachment's recognition-capable face paired with its
    /// image decoded and cropped to that face.
    pub fn recognizable_faces_and_cropped_images_in_result(
        &self,
        result: &SessionResult,
        bearing: Option<Bearing>,
    ) -> BoxStream<'static, Result<FaceCapture<RecognizableFace, DynamicImage>, FlowError>> {
        let pairs: Vec<(RecognizableFace, ImageRef, Bearing)> = result
            .attachments
            .iter()
            .filter(|attachment| bearing_matches(attachment, bearing))
            .filter_map(|attachment| {
                let recognizable = attachment.face.recognizable()?.clone();
                let image = attachment.image.clone()?;
                Some((recognizable, image, attachment.bearing))
            })
            .collect();
        crop_pairs(pairs)
    }
}

/// Shared decode-and-crop tail for the combined cropped views.
fn crop_pairs<F>(
    pairs: Vec<(F, ImageRef, Bearing)>,
) -> BoxStream<'static, Result<FaceCapture<F, DynamicImage>, FlowError>>
where
    F: AsRef<Face> + Send + 'static,
{
    stream::iter(pairs)
        .then(|(face, image_ref, bearing)| async move {
            let bounds = face.as_ref().bounds.clone();
            let cropped = run_blocking(move || {
                let decoded = imaging::decode_bytes(&image_ref.data)?;
                imaging::crop_to_bounds(&decoded, &bounds)
            })
            .await;
            cropped.map(|image| FaceCapture { face, image, bearing })
        })
        .filter_map(|capture| future::ready(capture.ok()))
        .map(Ok)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceflow_sdk::SampleFace;
    use std::sync::Arc;

    fn attachment(bearing: Bearing, uri: Option<&str>) -> Attachment {
        Attachment {
            face: SampleFace::Detected(Face {
                bounds: BoundingBox { x: 0.0, y: 0.0, width: 2.0, height: 2.0 },
                quality: 0.9,
            }),
            image: uri.map(|u| ImageRef::new(u, Arc::<[u8]>::from(Vec::new().into_boxed_slice()))),
            bearing,
        }
    }

    #[test]
    fn test_qualifying_refs_requires_image_and_bearing() {
        let result = SessionResult {
            attachments: vec![
                attachment(Bearing::Straight, Some("a")),
                attachment(Bearing::Straight, None),
                attachment(Bearing::Left, Some("b")),
                attachment(Bearing::Straight, Some("c")),
            ],
            error: None,
        };

        let all: Vec<String> = qualifying_refs(&result, None)
            .into_iter()
            .map(|r| r.uri)
            .collect();
        assert_eq!(all, vec!["a", "b", "c"], "original order preserved");

        let straight: Vec<String> = qualifying_refs(&result, Some(Bearing::Straight))
            .into_iter()
            .map(|r| r.uri)
            .collect();
        assert_eq!(straight, vec!["a", "c"]);

        assert!(qualifying_refs(&result, Some(Bearing::Right)).is_empty());
    }
}
