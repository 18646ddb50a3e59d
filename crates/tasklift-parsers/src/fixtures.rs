//! Raw message fixtures shared by parser tests

/// Three messages: the root carries the first reply, which carries the
/// original. The outer message replies to an id that is not present.
pub const NESTED_THREAD: &str = "From: Alex <alex@example.com>\r\n\
To: Bo <bo@example.com>\r\n\
Subject: Re: Launch plan\r\n\
Message-ID: <m3@example.com>\r\n\
In-Reply-To: <missing@example.com>\r\n\
Date: Wed, 03 Jan 2024 10:00:00 +0000\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Alex will confirm data source access by Feb 10.\r\n\
--outer\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
From: bo@example.com\r\n\
To: ALEX@example.com\r\n\
Subject: Re: Launch plan\r\n\
Message-ID: <m2@example.com>\r\n\
In-Reply-To: <m1@example.com>\r\n\
Date: Tue, 02 Jan 2024 10:00:00 +0000\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"inner\"\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\
\r\n\
Who owns the data source access?\r\n\
--inner\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
From: Carol <carol@example.com>\r\n\
To: bo@example.com\r\n\
Subject: Launch plan\r\n\
Message-ID: <m1@example.com>\r\n\
Date: Mon, 01 Jan 2024 10:00:00 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
Kicking off the launch plan.\r\n\
--inner--\r\n\
--outer--\r\n";

/// A single plain message
pub const SIMPLE_MESSAGE: &str = "From: Alex Example <alex@example.com>\r\n\
To: Bo <bo@example.com>\r\n\
Subject: Fwd: Budget review\r\n\
Message-ID: <solo@example.com>\r\n\
Date: Mon, 01 Jan 2024 09:00:00 +0000\r\n\
\r\n\
Bo, please send the budget review to finance by Friday.\r\n\
\r\n\
Thanks\r\n\
Alex\r\n";

/// A message with only an HTML body
pub const HTML_ONLY_MESSAGE: &str = "From: Dana <dana@example.com>\r\n\
Subject: Agenda\r\n\
Message-ID: <html@example.com>\r\n\
Date: Mon, 01 Jan 2024 09:00:00 +0000\r\n\
MIME-Version: 1.0\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body><p>Dana to book the room for Tuesday.</p></body></html>\r\n";

/// An outer message whose attached message is empty
pub const EMPTY_NESTED_MESSAGE: &str = "From: Owen <o@x.com>\r\n\
To: a@x.com\r\n\
Subject: Notes\r\n\
Message-ID: <o@x>\r\n\
Date: Mon, 01 Jan 2024 09:00:00 +0000\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/plain\r\n\
\r\n\
Outer body\r\n\
--b\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
\r\n\
--b--\r\n";
