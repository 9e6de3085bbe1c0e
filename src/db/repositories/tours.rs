use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::{
    db::{
        helpers::{parse_datetime, to_i64, to_u32},
        Database,
    },
    models::{
        Hotspot, ImageId, PanoramaImage, PropertyDetails, StoredTour, TourDocument, TourId,
        TourSummary,
    },
};

fn row_to_image(row: &Row) -> Result<PanoramaImage> {
    let image_id: i64 = row.get("image_id")?;
    let width: i64 = row.get("width")?;
    let height: i64 = row.get("height")?;

    Ok(PanoramaImage {
        id: ImageId(to_u32(image_id, "image_id")?),
        name: row.get("name")?,
        preview: row.get("preview")?,
        stored_url: row.get("stored_url")?,
        format: row.get("format")?,
        width: to_u32(width, "width")?,
        height: to_u32(height, "height")?,
        bytes: Arc::default(),
    })
}

fn row_to_hotspot(row: &Row) -> Result<Hotspot> {
    let linked: i64 = row.get("linked_image_id")?;
    Ok(Hotspot {
        name: row.get("name")?,
        linked_image: ImageId(to_u32(linked, "linked_image_id")?),
        pitch: row.get("pitch")?,
        yaw: row.get("yaw")?,
    })
}

impl Database {
    /// Writes the whole aggregate in one transaction.
    pub async fn insert_tour(&self, tour: &StoredTour) -> Result<()> {
        let record = tour.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let tour_id = record.id.0.as_str();
            let details = &record.document.details;

            tx.execute(
                "INSERT INTO tours (id, rooms, bathrooms, area, address, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    tour_id,
                    i64::from(details.rooms),
                    i64::from(details.bathrooms),
                    details.area,
                    details.address,
                    record.created_at.to_rfc3339(),
                ],
            )
            .context("failed to insert tour")?;

            for (position, image) in record.document.images.iter().enumerate() {
                tx.execute(
                    "INSERT INTO tour_images (tour_id, image_id, position, name, preview, stored_url, format, width, height)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        tour_id,
                        i64::from(image.id.0),
                        to_i64(position)?,
                        image.name,
                        image.preview,
                        image.stored_url,
                        image.format,
                        i64::from(image.width),
                        i64::from(image.height),
                    ],
                )
                .with_context(|| format!("failed to insert image {}", image.id))?;
            }

            for (source, hotspots) in &record.document.hotspots {
                for (position, hotspot) in hotspots.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO hotspots (tour_id, source_image_id, position, name, linked_image_id, pitch, yaw)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            tour_id,
                            i64::from(source.0),
                            to_i64(position)?,
                            hotspot.name,
                            i64::from(hotspot.linked_image.0),
                            hotspot.pitch,
                            hotspot.yaw,
                        ],
                    )
                    .with_context(|| format!("failed to insert hotspot on image {source}"))?;
                }
            }

            tx.commit().context("failed to commit tour")?;
            Ok(())
        })
        .await
    }

    pub async fn get_tour(&self, tour_id: &TourId) -> Result<Option<StoredTour>> {
        let tour_id = tour_id.clone();
        self.execute(move |conn| {
            let header = conn
                .query_row(
                    "SELECT rooms, bathrooms, area, address, created_at
                     FROM tours
                     WHERE id = ?1",
                    params![tour_id.0],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()?;

            let Some((rooms, bathrooms, area, address, created_at)) = header else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT image_id, name, preview, stored_url, format, width, height
                 FROM tour_images
                 WHERE tour_id = ?1
                 ORDER BY position ASC",
            )?;
            let mut rows = stmt.query(params![tour_id.0])?;
            let mut images = Vec::new();
            while let Some(row) = rows.next()? {
                images.push(row_to_image(row)?);
            }

            let mut stmt = conn.prepare(
                "SELECT source_image_id, name, linked_image_id, pitch, yaw
                 FROM hotspots
                 WHERE tour_id = ?1
                 ORDER BY source_image_id ASC, position ASC",
            )?;
            let mut rows = stmt.query(params![tour_id.0])?;
            let mut hotspots: BTreeMap<ImageId, Vec<Hotspot>> = BTreeMap::new();
            while let Some(row) = rows.next()? {
                let source: i64 = row.get("source_image_id")?;
                let source = ImageId(to_u32(source, "source_image_id")?);
                hotspots.entry(source).or_default().push(row_to_hotspot(row)?);
            }

            Ok(Some(StoredTour {
                created_at: parse_datetime(&created_at, "created_at")?,
                id: tour_id,
                document: TourDocument {
                    details: PropertyDetails {
                        rooms: to_u32(rooms, "rooms")?,
                        bathrooms: to_u32(bathrooms, "bathrooms")?,
                        area,
                        address,
                    },
                    images,
                    hotspots,
                },
            }))
        })
        .await
    }

    pub async fn list_tours(&self) -> Result<Vec<TourSummary>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.address, t.rooms, t.bathrooms, t.created_at,
                        (SELECT COUNT(*) FROM tour_images i WHERE i.tour_id = t.id) AS image_count,
                        (SELECT COUNT(*) FROM hotspots h WHERE h.tour_id = t.id) AS hotspot_count
                 FROM tours t
                 ORDER BY t.created_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut tours = Vec::new();
            while let Some(row) = rows.next()? {
                let created_at: String = row.get("created_at")?;
                tours.push(TourSummary {
                    id: TourId(row.get("id")?),
                    address: row.get("address")?,
                    rooms: to_u32(row.get("rooms")?, "rooms")?,
                    bathrooms: to_u32(row.get("bathrooms")?, "bathrooms")?,
                    image_count: to_u32(row.get("image_count")?, "image_count")?,
                    hotspot_count: to_u32(row.get("hotspot_count")?, "hotspot_count")?,
                    created_at: parse_datetime(&created_at, "created_at")?,
                });
            }

            Ok(tours)
        })
        .await
    }

    /// Hotspots whose source panorama was uploaded to `stored_url`.
    pub async fn hotspots_for_stored_image(&self, stored_url: &str) -> Result<Vec<Hotspot>> {
        let stored_url = stored_url.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT h.name, h.linked_image_id, h.pitch, h.yaw
                 FROM hotspots h
                 JOIN tour_images i
                   ON i.tour_id = h.tour_id AND i.image_id = h.source_image_id
                 WHERE i.stored_url = ?1
                 ORDER BY h.tour_id ASC, h.position ASC",
            )?;

            let mut rows = stmt.query(params![stored_url])?;
            let mut hotspots = Vec::new();
            while let Some(row) = rows.next()? {
                hotspots.push(row_to_hotspot(row)?);
            }

            Ok(hotspots)
        })
        .await
    }
}
