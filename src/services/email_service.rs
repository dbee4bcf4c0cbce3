use anyhow::{Context, Result};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;
use crate::models::{Booking, Training};

/// Sends templated booking lifecycle emails over SMTP.
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    public_base_url: String,
}

impl EmailService {
    pub fn new(config: SmtpConfig, public_base_url: String) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("Failed to create SMTP transport")?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from = Mailbox::new(
            Some(config.from_name.clone()),
            config
                .from_email
                .parse()
                .context("Invalid from address in SMTP config")?,
        );

        Ok(Self {
            transport: builder.build(),
            from,
            public_base_url,
        })
    }

    pub async fn send_booking_confirmation(
        &self,
        booking: &Booking,
        training: &Training,
    ) -> Result<()> {
        let subject = format!("Booking confirmation: {}", training.title);
        let body = render_confirmation(booking, training, &self.public_base_url);

        self.send(&booking.email, &subject, body).await?;
        info!("Sent booking confirmation for {} to {}", booking.id, booking.email);

        Ok(())
    }

    pub async fn send_booking_cancellation(
        &self,
        booking: &Booking,
        training: &Training,
    ) -> Result<()> {
        let subject = format!("Booking cancelled: {}", training.title);
        let body = render_cancellation(booking, training);

        self.send(&booking.email, &subject, body).await?;
        info!("Sent cancellation notice for {} to {}", booking.id, booking.email);

        Ok(())
    }

    pub async fn send_training_reminder(
        &self,
        booking: &Booking,
        training: &Training,
    ) -> Result<()> {
        let subject = format!("Training reminder: {}", training.title);
        let body = render_reminder(booking, training);

        self.send(&booking.email, &subject, body).await?;
        info!("Sent training reminder for {} to {}", booking.id, booking.email);

        Ok(())
    }

    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("Invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("Failed to send email")?;

        Ok(())
    }
}

fn training_details(training: &Training) -> String {
    format!(
        "<ul>\
            <li><strong>Title:</strong> {}</li>\
            <li><strong>Date:</strong> {}</li>\
            <li><strong>Time:</strong> {}</li>\
         </ul>",
        training.title,
        training.date_formatted(),
        training.time_formatted()
    )
}

fn render_confirmation(booking: &Booking, training: &Training, base_url: &str) -> String {
    let confirm_url = format!("{}/booking/confirm/{}", base_url, booking.confirmation_token);
    let cancel_url = format!("{}/booking/cancel/{}", base_url, booking.confirmation_token);

    format!(
        "<h2>Booking confirmation</h2>\
         <p>Hello, {}!</p>\
         <p>You are booked for the following training:</p>\
         {}\
         <p><strong>Price:</strong> {:.2}</p>\
         <p><a href='{}'>Confirm booking</a> | <a href='{}'>Cancel booking</a></p>\
         <p>Thank you for choosing our trainings!</p>",
        booking.full_name,
        training_details(training),
        training.price,
        confirm_url,
        cancel_url
    )
}

fn render_cancellation(booking: &Booking, training: &Training) -> String {
    format!(
        "<h2>Booking cancelled</h2>\
         <p>Hello, {}!</p>\
         <p>Your booking for the following training has been cancelled:</p>\
         {}\
         <p>You are welcome to book any other available training on our site.</p>",
        booking.full_name,
        training_details(training)
    )
}

fn render_reminder(booking: &Booking, training: &Training) -> String {
    format!(
        "<h2>Training reminder</h2>\
         <p>Hello, {}!</p>\
         <p>A reminder about your upcoming training:</p>\
         {}\
         <p>Please bring your gear and arrive a few minutes early. See you there!</p>",
        booking.full_name,
        training_details(training)
    )
}
