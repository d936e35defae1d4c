//! Pipelines chaining detection, recognition, identification and cropping.
//!
//! Every operation here is plumbing over the engine contracts: obtain the
//! cached engine, hop to the blocking pool, forward the call, shape the
//! outcome with the adapters in [`crate::adapter`].

use std::cmp::Ordering;
use std::path::PathBuf;

use faceflow_sdk::{DetectionOptions, Engine, Face, FaceTemplate, RecognizableFace};
use futures::stream::BoxStream;
use image::DynamicImage;

use crate::adapter::{emit_all, expect_single, run_blocking};
use crate::engine::FaceFlow;
use crate::error::FlowError;
use crate::imaging;

impl FaceFlow {
    /// Decode encoded image bytes off the calling task.
    pub async fn decode_image(&self, bytes: Vec<u8>) -> Result<DynamicImage, FlowError> {
        run_blocking(move || imaging::decode_bytes(&bytes)).await
    }

    /// Read and decode an image file off the calling task.
    pub async fn decode_image_file(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<DynamicImage, FlowError> {
        let path = path.into();
        run_blocking(move || {
            let bytes = std::fs::read(&path)
                .map_err(|err| FlowError::ImageDecoding(format!("{}: {err}", path.display())))?;
            imaging::decode_bytes(&bytes)
        })
        .await
    }

    /// Detect up to `limit` faces, emitted in the engine's detection order.
    /// Zero faces is a valid empty stream, not an error.
    pub fn detect_faces(
        &self,
        image: DynamicImage,
        limit: usize,
    ) -> BoxStream<'static, Result<Face, FlowError>> {
        let flow = self.clone();
        emit_all(async move {
            let engine = flow.engine().await?;
            run_blocking(move || {
                let faces = engine.detect_faces(&image, limit, &DetectionOptions::default())?;
                tracing::debug!(count = faces.len(), limit, "faces detected");
                Ok(faces)
            })
            .await
        })
    }

    /// Detect faces and extract a recognition template for each.
    pub fn detect_recognizable_faces(
        &self,
        image: DynamicImage,
        limit: usize,
    ) -> BoxStream<'static, Result<RecognizableFace, FlowError>> {
        let flow = self.clone();
        emit_all(async move {
            let engine = flow.engine().await?;
            run_blocking(move || {
                let faces = engine.detect_faces(&image, limit, &DetectionOptions::default())?;
                if faces.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(engine.extract_templates(&faces, &image)?)
            })
            .await
        })
    }

    /// Identify enrolled users matching the most prominent face in the image.
    ///
    /// Emits `(user id, score)` pairs ranked by descending score, ties broken
    /// by ascending user id. An image without a face yields an empty stream.
    pub fn identify_users(
        &self,
        image: DynamicImage,
    ) -> BoxStream<'static, Result<(String, f32), FlowError>> {
        let flow = self.clone();
        emit_all(async move {
            let engine = flow.engine().await?;
            run_blocking(move || {
                let faces = engine.detect_faces(&image, 1, &DetectionOptions::default())?;
                if faces.is_empty() {
                    tracing::debug!("no face to identify");
                    return Ok(Vec::new());
                }
                let recognizable = engine.extract_templates(&faces, &image)?;
                match recognizable.into_iter().next() {
                    Some(probe) => rank_users(engine.as_ref(), &probe),
                    None => Ok(Vec::new()),
                }
            })
            .await
        })
    }

    /// Identify enrolled users matching an already-extracted face, with the
    /// same ranking as [`identify_users`](Self::identify_users).
    pub fn identify_users_in_face(
        &self,
        face: RecognizableFace,
    ) -> BoxStream<'static, Result<(String, f32), FlowError>> {
        let flow = self.clone();
        emit_all(async move {
            let engine = flow.engine().await?;
            run_blocking(move || rank_users(engine.as_ref(), &face)).await
        })
    }

    /// Authenticate a user against the single face in an image.
    ///
    /// The image must contain exactly one recognizable face; zero or several
    /// faces is an error. Succeeds iff any enrolled-template comparison score
    /// reaches the engine's authentication threshold.
    pub async fn authenticate_user(
        &self,
        user_id: &str,
        image: DynamicImage,
    ) -> Result<bool, FlowError> {
        let probe = expect_single(self.detect_recognizable_faces(image, 1)).await?;
        self.authenticate_user_in_faces(user_id, vec![probe]).await
    }

    /// Authenticate a user against already-extracted probe faces.
    ///
    /// A user with no enrolled templates never authenticates.
    pub async fn authenticate_user_in_faces(
        &self,
        user_id: &str,
        faces: Vec<RecognizableFace>,
    ) -> Result<bool, FlowError> {
        let engine = self.engine().await?;
        let user = user_id.to_string();
        run_blocking(move || {
            let threshold = engine.authentication_threshold();
            let probe: Vec<FaceTemplate> =
                faces.into_iter().map(|face| face.template).collect();
            let enrolled = engine.faces_of_user(&user)?;
            for candidate in &enrolled {
                let score =
                    engine.compare_templates(&probe, std::slice::from_ref(&candidate.template))?;
                if score >= threshold {
                    tracing::debug!(user = %user, score, threshold, "authenticated");
                    return Ok(true);
                }
            }
            tracing::debug!(user = %user, threshold, enrolled = enrolled.len(), "not authenticated");
            Ok(false)
        })
        .await
    }

    /// Compare a probe face against candidate faces, returning the engine's
    /// aggregate similarity score.
    pub async fn compare_faces(
        &self,
        probe: RecognizableFace,
        candidates: Vec<RecognizableFace>,
    ) -> Result<f32, FlowError> {
        let engine = self.engine().await?;
        run_blocking(move || {
            let gallery: Vec<FaceTemplate> =
                candidates.into_iter().map(|face| face.template).collect();
            Ok(engine.compare_templates(std::slice::from_ref(&probe.template), &gallery)?)
        })
        .await
    }

    /// Crop the image to the face's bounding box.
    pub async fn crop_image_to_face(
        &self,
        image: DynamicImage,
        face: Face,
    ) -> Result<DynamicImage, FlowError> {
        run_blocking(move || imaging::crop_to_bounds(&image, &face.bounds)).await
    }

    /// Assign faces to a user, creating the user if needed.
    pub async fn assign_faces_to_user(
        &self,
        faces: Vec<RecognizableFace>,
        user_id: &str,
    ) -> Result<(), FlowError> {
        let engine = self.engine().await?;
        let user = user_id.to_string();
        run_blocking(move || {
            engine.assign_templates(&faces, &user)?;
            tracing::info!(user = %user, count = faces.len(), "faces assigned to user");
            Ok(())
        })
        .await
    }

    /// Delete a user and every face assigned to them.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), FlowError> {
        let engine = self.engine().await?;
        let user = user_id.to_string();
        run_blocking(move || {
            engine.delete_users(std::slice::from_ref(&user))?;
            tracing::info!(user = %user, "user deleted");
            Ok(())
        })
        .await
    }

    /// Enumerate enrolled user identifiers.
    pub fn users(&self) -> BoxStream<'static, Result<String, FlowError>> {
        let flow = self.clone();
        emit_all(async move {
            let engine = flow.engine().await?;
            run_blocking(move || Ok(engine.users()?)).await
        })
    }

    /// Faces enrolled for one user.
    pub fn faces_of_user(
        &self,
        user_id: &str,
    ) -> BoxStream<'static, Result<RecognizableFace, FlowError>> {
        let flow = self.clone();
        let user = user_id.to_string();
        emit_all(async move {
            let engine = flow.engine().await?;
            run_blocking(move || Ok(engine.faces_of_user(&user)?)).await
        })
    }
}

/// Score the probe against every enrolled user and rank the results.
fn rank_users(
    engine: &dyn Engine,
    probe: &RecognizableFace,
) -> Result<Vec<(String, f32)>, FlowError> {
    let probe_templates = std::slice::from_ref(&probe.template);
    let mut scored = Vec::new();
    for user in engine.users()? {
        let gallery: Vec<FaceTemplate> = engine
            .faces_of_user(&user)?
            .into_iter()
            .map(|face| face.template)
            .collect();
        if gallery.is_empty() {
            continue;
        }
        let score = engine.compare_templates(probe_templates, &gallery)?;
        scored.push((user, score));
    }
    sort_ranked(&mut scored);
    tracing::debug!(candidates = scored.len(), "users ranked");
    Ok(scored)
}

/// Descending score; equal scores ordered by ascending user id.
fn sort_ranked(scored: &mut [(String, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}
