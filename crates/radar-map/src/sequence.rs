//! Latest-frame and loop assembly.

use bytes::Bytes;
use futures::future::try_join_all;
use radar_common::{frame_ticks, RadarError, RadarResult};
use renderer::{encode_gif, hold_last_frame};
use tracing::{info, instrument};

use crate::map::RadarMap;

impl RadarMap {
    /// The newest composited frame, or `None` when the service has no
    /// imagery for the primary layer.
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn get_latest_frame(&self) -> RadarResult<Option<Bytes>> {
        match self.get_time_dimension(self.primary_layer()).await? {
            Some(dimension) => Ok(Some(self.composite_frame(dimension.latest()).await?)),
            None => Ok(None),
        }
    }

    /// Animated GIF of every frame the service offers, oldest first, with
    /// the newest frame held for a few extra frames.
    ///
    /// The basemap and legends are fetched once up front; frames are then
    /// built concurrently. Any frame failing fails the whole loop.
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn get_loop(&self, fps: u32) -> RadarResult<Bytes> {
        if fps == 0 {
            return Err(RadarError::invalid_parameter("fps", "must be at least 1"));
        }

        let layer = self.primary_layer();
        let dimension = self.get_time_dimension(layer).await?.ok_or_else(|| {
            RadarError::DataNotAvailable(format!("no time dimension for layer {}", layer))
        })?;

        self.get_basemap().await;
        if self.config.legend {
            for &layer in &self.config.layers {
                self.get_legend(layer).await?;
            }
        }

        let ticks = frame_ticks(&dimension);
        let mut frames = try_join_all(ticks.iter().map(|&time| self.composite_frame(time))).await?;
        hold_last_frame(&mut frames);

        let frame_count = frames.len();
        let gif = tokio::task::spawn_blocking(move || encode_gif(&frames, fps))
            .await
            .map_err(|e| RadarError::InternalError(format!("GIF encoding task failed: {}", e)))??;

        info!(
            frames = frame_count,
            fps,
            start = %dimension.start,
            end = %dimension.end,
            bytes = gif.len(),
            "Assembled radar loop"
        );
        Ok(Bytes::from(gif))
    }

    /// Build a loop at the default frame rate and keep it as [`Self::image`].
    pub async fn update(&self) -> RadarResult<Bytes> {
        let image = self.get_loop(renderer::DEFAULT_FPS).await?;
        *self.image.write().await = Some(image.clone());
        Ok(image)
    }
}
